//! Filter expression tree
//!
//! A `QueryFilter` is a tagged tree of `(field, operator, value)` leaves joined
//! by logical groups. Executors fold it into SQL or evaluate it in memory.

use crate::query_builder::builder::QueryBuilder;
use serde_json::Value;

/// Query condition operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
    Between,   // BETWEEN low AND high, value is a two-element array
}

impl QueryOperator {
    /// SQL symbol for binary comparison operators
    pub fn to_sql(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
            QueryOperator::Between => "BETWEEN",
        }
    }
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
    Not(Box<QueryFilter>),
    /// `field IN (subquery)`; the subquery is uncorrelated and yields its first select column
    InSubquery {
        field: String,
        query: Box<QueryBuilder>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// AND of the present filters; `None` when every filter is absent
    pub fn all(filters: Vec<Option<QueryFilter>>) -> Option<Self> {
        let mut present: Vec<QueryFilter> = filters.into_iter().flatten().collect();
        match present.len() {
            0 => None,
            1 => present.pop(),
            _ => Some(Self::and(present)),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: QueryFilter) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value))
    }

    pub fn ne(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value))
    }

    pub fn gt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value))
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value))
    }

    pub fn lt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value))
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value))
    }

    /// LIKE condition, `%` and `_` wildcards
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Inclusive range condition
    pub fn between(field: &str, low: Value, high: Value) -> Self {
        Self::condition(
            field,
            QueryOperator::Between,
            Some(Value::Array(vec![low, high])),
        )
    }

    pub fn in_subquery(field: &str, query: QueryBuilder) -> Self {
        Self::InSubquery {
            field: field.to_string(),
            query: Box::new(query),
        }
    }

    /// True when the filter places no constraint on a row.
    ///
    /// Vacuous filters are skipped by both the SQL generator and the in-memory
    /// evaluator instead of being rendered as a tautology.
    pub fn is_vacuous(&self) -> bool {
        match self {
            QueryFilter::Group { filters, .. } => filters.iter().all(QueryFilter::is_vacuous),
            QueryFilter::Not(inner) => inner.is_vacuous(),
            QueryFilter::Condition(QueryCondition {
                operator: QueryOperator::NotIn,
                value: Some(Value::Array(values)),
                ..
            }) => values.is_empty(),
            _ => false,
        }
    }
}
