//! Query builder utilities
//!
//! This module provides the query description types and their SQL rendering.

pub mod aggregation;
pub mod builder;
pub mod filter;
pub mod grouping;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod update;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregateFunction, SelectField};
pub use builder::QueryBuilder;
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use grouping::GroupBy;
pub use join::{JoinClause, JoinType, TableRef};
pub use ordering::{NullsOrder, OrderBy, SortOrder};
pub use pagination::{Page, PageRequest};
pub use sql_generation::SqlGenerator;
pub use update::{UpdateOperation, UpdateSet};
