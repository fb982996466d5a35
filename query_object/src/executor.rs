//! Query execution seam
//!
//! Repositories depend on `QueryExecutor` only; a PostgreSQL pool and an
//! in-process table source both implement it.

use crate::errors::QueryError;
use crate::query_builder::QueryBuilder;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// One result row, keyed by output column name
pub type Record = serde_json::Map<String, Value>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a SELECT and return every row it yields, in order
    async fn fetch_rows(&self, query: &QueryBuilder) -> Result<Vec<Record>, QueryError>;

    /// Run a single-column aggregate SELECT and return its value
    async fn fetch_count(&self, query: &QueryBuilder) -> Result<i64, QueryError>;

    /// Apply the query's `UpdateSet` to every matching row; returns rows affected
    async fn execute_update(&self, query: &QueryBuilder) -> Result<u64, QueryError>;

    /// Delete every matching row; returns rows affected
    async fn execute_delete(&self, query: &QueryBuilder) -> Result<u64, QueryError>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    async fn fetch_rows(&self, query: &QueryBuilder) -> Result<Vec<Record>, QueryError> {
        (**self).fetch_rows(query).await
    }

    async fn fetch_count(&self, query: &QueryBuilder) -> Result<i64, QueryError> {
        (**self).fetch_count(query).await
    }

    async fn execute_update(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        (**self).execute_update(query).await
    }

    async fn execute_delete(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        (**self).execute_delete(query).await
    }
}
