//! PostgreSQL rendering of a `QueryBuilder`
//!
//! Identifiers are validated and written inline; every value becomes a `$n`
//! placeholder, numbered in the order it appears in the statement.

use crate::errors::QueryError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::builder::QueryBuilder;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::{JoinClause, JoinType, TableRef};
use crate::query_builder::ordering::OrderBy;
use crate::validation::{ColumnRef, ValidatedFieldName, ValidatedTableName};
use serde_json::Value;

pub struct SqlGenerator;

/// Bound values collected while rendering one statement
#[derive(Debug, Default)]
struct SqlParams {
    values: Vec<Value>,
}

impl SqlParams {
    fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

impl SqlGenerator {
    /// Render a SELECT statement
    pub fn build_select(query: &QueryBuilder) -> Result<(String, Vec<Value>), QueryError> {
        let mut params = SqlParams::default();
        let sql = Self::select_sql(query, &mut params, None)?;
        debug_log!("[SELECT] SQL: {} ({} params)", sql, params.values.len());
        Ok((sql, params.values))
    }

    /// Render a SELECT that also yields `ordinal`, the 1-based position of
    /// each row under the query's ORDER BY.
    ///
    /// Sort keys must be input columns, not output aliases, since they are
    /// repeated inside the window.
    pub fn build_select_numbered(
        query: &QueryBuilder,
        ordinal: &str,
    ) -> Result<(String, Vec<Value>), QueryError> {
        let ordinal = ValidatedFieldName::new(ordinal)?;
        let mut params = SqlParams::default();
        let sql = Self::select_sql(query, &mut params, Some(ordinal.as_str()))?;
        debug_log!("[SELECT] SQL: {} ({} params)", sql, params.values.len());
        Ok((sql, params.values))
    }

    /// Render a bulk UPDATE of the query's FROM table
    pub fn build_update(query: &QueryBuilder) -> Result<(String, Vec<Value>), QueryError> {
        let from = Self::bulk_target(query)?;
        let update_set = query
            .update_set
            .as_ref()
            .filter(|set| !set.is_empty())
            .ok_or_else(|| QueryError::invalid("UPDATE needs at least one assignment"))?;

        let mut params = SqlParams::default();
        let mut assignments = Vec::with_capacity(update_set.len());
        for (field, operation) in update_set.iter() {
            let column = ValidatedFieldName::new(field)?;
            let placeholder = params.push(operation.value().clone());
            assignments.push(operation.to_sql(column.as_str(), &placeholder));
        }

        let mut sql = format!("UPDATE {} SET {}", from, assignments.join(", "));
        if let Some(where_sql) = Self::where_sql(&query.conditions, &mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        debug_log!("[UPDATE] SQL: {} ({} params)", sql, params.values.len());
        Ok((sql, params.values))
    }

    /// Render a bulk DELETE from the query's FROM table
    pub fn build_delete(query: &QueryBuilder) -> Result<(String, Vec<Value>), QueryError> {
        let from = Self::bulk_target(query)?;

        let mut params = SqlParams::default();
        let mut sql = format!("DELETE FROM {}", from);
        if let Some(where_sql) = Self::where_sql(&query.conditions, &mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        debug_log!("[DELETE] SQL: {} ({} params)", sql, params.values.len());
        Ok((sql, params.values))
    }

    /// Build WHERE clause from conditions; empty when no condition constrains anything
    pub fn build_where_clause(conditions: &[QueryFilter]) -> Result<(String, Vec<Value>), QueryError> {
        let mut params = SqlParams::default();
        match Self::where_sql(conditions, &mut params)? {
            Some(where_sql) => Ok((format!("WHERE {}", where_sql), params.values)),
            None => Ok((String::new(), Vec::new())),
        }
    }

    fn select_sql(
        query: &QueryBuilder,
        params: &mut SqlParams,
        ordinal: Option<&str>,
    ) -> Result<String, QueryError> {
        let from = query
            .from
            .as_ref()
            .ok_or_else(|| QueryError::invalid("query has no FROM table"))?;

        let mut select = Self::build_select_clause(&query.select)?;
        if let Some(ordinal) = ordinal {
            let window = if query.order_by.is_empty() {
                String::new()
            } else {
                format!("ORDER BY {}", Self::order_items(&query.order_by)?)
            };
            select.push_str(&format!(", ROW_NUMBER() OVER ({}) AS {}", window, ordinal));
        }

        let mut parts = vec![
            format!("SELECT {}", select),
            format!("FROM {}", Self::table_sql(from)?),
        ];

        let joins = Self::build_join_clause(&query.joins)?;
        if !joins.is_empty() {
            parts.push(joins);
        }
        if let Some(where_sql) = Self::where_sql(&query.conditions, params)? {
            parts.push(format!("WHERE {}", where_sql));
        }
        let group_by = Self::build_group_by_clause(query.group_by.as_ref())?;
        if !group_by.is_empty() {
            parts.push(group_by);
        }
        let order = Self::build_order_clause(&query.order_by)?;
        if !order.is_empty() {
            parts.push(order);
        }
        let limit = Self::build_limit_clause(query.limit, query.offset);
        if !limit.is_empty() {
            parts.push(limit);
        }

        Ok(parts.join(" "))
    }

    fn bulk_target(query: &QueryBuilder) -> Result<String, QueryError> {
        if !query.joins.is_empty() {
            return Err(QueryError::invalid(
                "bulk statements cannot join; use a subquery condition instead",
            ));
        }
        let from = query
            .from
            .as_ref()
            .ok_or_else(|| QueryError::invalid("bulk statement has no target table"))?;
        Self::table_sql(from)
    }

    fn where_sql(conditions: &[QueryFilter], params: &mut SqlParams) -> Result<Option<String>, QueryError> {
        let mut rendered = Vec::with_capacity(conditions.len());
        for condition in conditions {
            if let Some(sql) = Self::filter_sql(condition, params)? {
                rendered.push(sql);
            }
        }

        if rendered.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rendered.join(" AND ")))
        }
    }

    fn filter_sql(filter: &QueryFilter, params: &mut SqlParams) -> Result<Option<String>, QueryError> {
        if filter.is_vacuous() {
            return Ok(None);
        }

        match filter {
            QueryFilter::Condition(condition) => Self::condition_sql(condition, params).map(Some),
            QueryFilter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let mut members = Vec::with_capacity(filters.len());
                for member in filters {
                    if let Some(sql) = Self::filter_sql(member, params)? {
                        members.push(sql);
                    }
                }

                match members.len() {
                    0 => Ok(None),
                    1 => Ok(members.pop()),
                    _ => Ok(Some(format!("({})", members.join(operator_str)))),
                }
            }
            QueryFilter::Not(inner) => {
                Ok(Self::filter_sql(inner, params)?.map(|sql| format!("NOT ({})", sql)))
            }
            QueryFilter::InSubquery { field, query } => {
                let column = ColumnRef::parse(field)?;
                let subquery = Self::select_sql(query, params, None)?;
                Ok(Some(format!("{} IN ({})", column, subquery)))
            }
        }
    }

    fn condition_sql(condition: &QueryCondition, params: &mut SqlParams) -> Result<String, QueryError> {
        let field = ColumnRef::parse(&condition.field)?;
        let operator = &condition.operator;

        match (operator, &condition.value) {
            (QueryOperator::Eq, None) => Ok(format!("{} IS NULL", field)),
            (QueryOperator::Ne, None) => Ok(format!("{} IS NOT NULL", field)),
            (QueryOperator::IsNull, _) => Ok(format!("{} IS NULL", field)),
            (QueryOperator::IsNotNull, _) => Ok(format!("{} IS NOT NULL", field)),
            (
                QueryOperator::Eq
                | QueryOperator::Ne
                | QueryOperator::Gt
                | QueryOperator::Gte
                | QueryOperator::Lt
                | QueryOperator::Lte
                | QueryOperator::Like,
                Some(value),
            ) => {
                let placeholder = params.push(value.clone());
                Ok(format!("{} {} {}", field, operator.to_sql(), placeholder))
            }
            (QueryOperator::In | QueryOperator::NotIn, Some(Value::Array(values))) => {
                if values.is_empty() {
                    // NOT IN () never gets here: it is vacuous
                    return Ok("1=0".to_string());
                }
                let placeholders: Vec<String> =
                    values.iter().map(|value| params.push(value.clone())).collect();
                Ok(format!(
                    "{} {} ({})",
                    field,
                    operator.to_sql(),
                    placeholders.join(", ")
                ))
            }
            (QueryOperator::Between, Some(Value::Array(bounds))) if bounds.len() == 2 => {
                let low = params.push(bounds[0].clone());
                let high = params.push(bounds[1].clone());
                Ok(format!("{} BETWEEN {} AND {}", field, low, high))
            }
            _ => Err(QueryError::invalid(format!(
                "{} on {} has a missing or malformed value",
                operator.to_sql(),
                field
            ))),
        }
    }

    /// Build SELECT list; `*` when no field is listed
    pub fn build_select_clause(fields: &[SelectField]) -> Result<String, QueryError> {
        if fields.is_empty() {
            return Ok("*".to_string());
        }

        let parts = fields
            .iter()
            .map(Self::select_field_sql)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(", "))
    }

    fn select_field_sql(field: &SelectField) -> Result<String, QueryError> {
        match field {
            SelectField::All => Ok("*".to_string()),
            SelectField::Field(name) => Ok(ColumnRef::parse(name)?.to_string()),
            SelectField::FieldWithAlias { field, alias } => Ok(format!(
                "{} AS {}",
                ColumnRef::parse(field)?,
                ValidatedFieldName::new(alias)?
            )),
            SelectField::Aggregate {
                function,
                field,
                alias,
            } => {
                let argument = match field {
                    Some(name) if function.is_distinct() => {
                        format!("DISTINCT {}", ColumnRef::parse(name)?)
                    }
                    Some(name) => ColumnRef::parse(name)?.to_string(),
                    None => "*".to_string(),
                };

                let aggregate = format!("{}({})", function.to_sql(), argument);
                match alias {
                    Some(alias) => Ok(format!(
                        "{} AS {}",
                        aggregate,
                        ValidatedFieldName::new(alias)?
                    )),
                    None => Ok(aggregate),
                }
            }
        }
    }

    fn table_sql(table: &TableRef) -> Result<String, QueryError> {
        let name = ValidatedTableName::new(&table.table)?;
        match &table.alias {
            Some(alias) => Ok(format!("{} AS {}", name, ValidatedTableName::new(alias)?)),
            None => Ok(name.to_string()),
        }
    }

    /// Build JOIN clauses
    pub fn build_join_clause(joins: &[JoinClause]) -> Result<String, QueryError> {
        let mut rendered = Vec::with_capacity(joins.len());
        for join in joins {
            let table = Self::table_sql(&join.table)?;
            if join.join_type == JoinType::Cross {
                rendered.push(format!("{} {}", join.join_type.to_sql(), table));
            } else {
                rendered.push(format!(
                    "{} {} ON {} = {}",
                    join.join_type.to_sql(),
                    table,
                    ColumnRef::parse(&join.left_field)?,
                    ColumnRef::parse(&join.right_field)?
                ));
            }
        }
        Ok(rendered.join(" "))
    }

    pub fn build_group_by_clause(group_by: Option<&GroupBy>) -> Result<String, QueryError> {
        match group_by {
            Some(group) if !group.fields.is_empty() => {
                let fields = group
                    .fields
                    .iter()
                    .map(|field| ColumnRef::parse(field).map(|c| c.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("GROUP BY {}", fields.join(", ")))
            }
            _ => Ok(String::new()),
        }
    }

    pub fn build_order_clause(order_by: &[OrderBy]) -> Result<String, QueryError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("ORDER BY {}", Self::order_items(order_by)?))
    }

    fn order_items(order_by: &[OrderBy]) -> Result<String, QueryError> {
        let mut items = Vec::with_capacity(order_by.len());
        for item in order_by {
            let mut sql = format!("{} {}", ColumnRef::parse(&item.field)?, item.order.to_sql());
            if let Some(nulls) = item.nulls {
                sql.push(' ');
                sql.push_str(nulls.to_sql());
            }
            items.push(sql);
        }

        Ok(items.join(", "))
    }

    pub fn build_limit_clause(limit: Option<i64>, offset: Option<i64>) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }
}
