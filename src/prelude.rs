//! Convenience re-exports for common roster-search usage
//!
//! ```rust
//! use roster_search::prelude::*;
//!
//! let condition = MemberSearchCondition::new().age_goe(25);
//! let request = PageRequest::first(10);
//! ```

// Core components
pub use crate::condition::MemberSearchCondition;
pub use crate::core::RosterSearch;
pub use crate::dto::{MemberTeamDto, TeamStatistics};
pub use crate::errors::{RosterError, RosterSearchError, SearchError};
pub use crate::repository::MemberRepository;
pub use crate::roster::{Member, Roster, Team};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, SearchConfig};

// Re-export commonly used query-object types for convenience
pub use query_object::prelude::*;

// Common external dependencies
pub use async_trait;
pub use sqlx;
pub use tokio;
