//! Query Object - query description and execution layer for roster-search
//!
//! This crate provides the tagged expression tree, the query builder, the
//! PostgreSQL SQL generator and the executors that run a built query either
//! against PostgreSQL or against an in-process table source.

#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod executor;
pub mod memory;
pub mod pg_executor;
pub mod prelude;
pub mod query_builder;
pub mod validation;

pub use errors::QueryError;
pub use executor::{QueryExecutor, Record};
pub use memory::{MemoryExecutor, TableSink, TableSource};
pub use pg_executor::PgExecutor;
pub use query_builder::{
    AggregateFunction, GroupBy, JoinClause, JoinType, NullsOrder, OrderBy, Page, PageRequest,
    QueryBuilder, QueryFilter, QueryOperator, SelectField, SortOrder, SqlGenerator,
    UpdateOperation, UpdateSet,
};
pub use validation::{ColumnRef, ValidatedFieldName, ValidatedTableName, ValidationError};
