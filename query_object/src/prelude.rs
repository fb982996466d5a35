//! Convenience re-exports for common query-object usage

// Execution
pub use crate::executor::{QueryExecutor, Record};
pub use crate::memory::{MemoryExecutor, TableSink, TableSource};
pub use crate::pg_executor::PgExecutor;

// Error types
pub use crate::errors::QueryError;

// Validation
pub use crate::validation::{ColumnRef, ValidatedFieldName, ValidatedTableName, ValidationError};

// Query building
pub use crate::query_builder::{
    AggregateFunction, GroupBy, JoinClause, JoinType, NullsOrder, OrderBy, Page, PageRequest,
    QueryBuilder, QueryFilter, QueryOperator, SelectField, SortOrder, UpdateOperation, UpdateSet,
};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
