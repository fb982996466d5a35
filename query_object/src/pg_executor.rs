//! PostgreSQL executor
//!
//! Rows are read back through `to_jsonb`, so a built query never needs a
//! matching Rust struct: every row arrives as a JSON object keyed by its
//! output column names. The outer select orders by a row ordinal computed
//! inside the query, since a subquery's ORDER BY does not bind the rows
//! around it.

use crate::errors::QueryError;
use crate::executor::{QueryExecutor, Record};
use crate::query_builder::{QueryBuilder, SqlGenerator};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            Value::String(s) => $query.bind(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            Value::Bool(b) => $query.bind(b),
            Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other.to_string()),
        }
    };
}

/// Ordinal column added to every row query and stripped from the records
const ROW_ORDINAL: &str = "row_ordinal";

/// Wrap `query` so each row comes back as one JSON record, in query order
fn records_sql(query: &QueryBuilder) -> Result<(String, Vec<Value>), QueryError> {
    let (sql, params) = SqlGenerator::build_select_numbered(query, ROW_ORDINAL)?;
    let sql = format!(
        "SELECT to_jsonb(q) - '{ordinal}' AS record FROM ({sql}) AS q ORDER BY q.{ordinal}",
        ordinal = ROW_ORDINAL,
        sql = sql
    );
    Ok((sql, params))
}

#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn execute(&self, operation: &str, sql: &str, params: Vec<Value>) -> Result<u64, QueryError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_json_param!(query, param);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| QueryError::database(operation, e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_rows(&self, query: &QueryBuilder) -> Result<Vec<Record>, QueryError> {
        let (sql, params) = records_sql(query)?;

        let mut rows = sqlx::query_scalar::<_, Json<Record>>(&sql);
        for param in params {
            rows = bind_json_param!(rows, param);
        }

        let records = rows
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueryError::database("fetch_rows", e))?;

        debug_log!("[fetch_rows] {} rows", records.len());
        Ok(records.into_iter().map(|Json(record)| record).collect())
    }

    async fn fetch_count(&self, query: &QueryBuilder) -> Result<i64, QueryError> {
        let (sql, params) = query.build()?;

        let mut count = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            count = bind_json_param!(count, param);
        }

        count
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QueryError::database("fetch_count", e))
    }

    async fn execute_update(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        let (sql, params) = SqlGenerator::build_update(query)?;
        self.execute("bulk_update", &sql, params).await
    }

    async fn execute_delete(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        let (sql, params) = SqlGenerator::build_delete(query)?;
        self.execute("bulk_delete", &sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::{OrderBy, PageRequest, QueryFilter, SelectField};
    use serde_json::json;

    #[test]
    fn test_records_follow_query_order() {
        let query = QueryBuilder::new()
            .select(vec![
                SelectField::field_as("m.member_id", "member_id"),
                SelectField::field_as("m.age", "age"),
            ])
            .from("member", "m")
            .filter(QueryFilter::gte("m.age", json!(20)))
            .order_by(OrderBy::desc("m.age"))
            .order_by(OrderBy::asc("m.member_id"))
            .paginate(&PageRequest::new(1, 2))
            .unwrap();

        let (sql, params) = records_sql(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT to_jsonb(q) - 'row_ordinal' AS record FROM (\
             SELECT m.member_id AS member_id, m.age AS age, \
             ROW_NUMBER() OVER (ORDER BY m.age DESC, m.member_id ASC) AS row_ordinal \
             FROM member AS m WHERE m.age >= $1 \
             ORDER BY m.age DESC, m.member_id ASC LIMIT 2 OFFSET 2) AS q ORDER BY q.row_ordinal"
        );
        assert_eq!(params, vec![json!(20)]);
    }

    #[test]
    fn test_unordered_query_still_numbers_rows() {
        let query = QueryBuilder::new()
            .select(vec![SelectField::field("t.name")])
            .from("team", "t");

        let (sql, _) = records_sql(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT to_jsonb(q) - 'row_ordinal' AS record FROM (\
             SELECT t.name, ROW_NUMBER() OVER () AS row_ordinal FROM team AS t\
             ) AS q ORDER BY q.row_ordinal"
        );
    }
}
