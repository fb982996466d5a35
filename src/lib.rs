//! # roster-search
//!
//! Dynamic member/team search over PostgreSQL. Optional filter values become
//! predicate fragments, present fragments are ANDed into one query, and a
//! paginated search runs a content query plus a count query, skipping the
//! count when the page already proves the total.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roster_search::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!
//!     let roster_search = RosterSearch::new(&config).await?;
//!     roster_search.auto_migrate(false).await?;
//!
//!     let members = roster_search.repository();
//!     let condition = MemberSearchCondition::new().team_name("teamA").age_goe(10);
//!     let page = members.search_page(&condition, &PageRequest::first(10)).await?;
//!
//!     for member in &page.content {
//!         println!("{:?} in {:?}", member.username, member.team_name);
//!     }
//!     println!("{} of {} members", page.number_of_elements(), page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! The same repository runs without a database on a `MemoryExecutor` over a
//! `Roster`.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod columns;
pub mod composer;
pub mod condition;
pub mod core;
pub mod dto;
pub mod errors;
pub mod migration;
pub mod predicates;
pub mod prelude;
pub mod repository;
pub mod roster;

// Re-export the main public types for convenience
pub use condition::MemberSearchCondition;
pub use crate::core::RosterSearch;
pub use dto::{MemberTeamDto, TeamStatistics};
pub use errors::{RosterError, RosterSearchError, SearchError};
pub use repository::MemberRepository;
pub use roster::{Member, Roster, Team};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, SearchConfig};

// Re-export the query layer used in the public API
pub use query_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
