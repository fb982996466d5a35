//! Query builder
//!
//! A `QueryBuilder` is a structured description of one SELECT, UPDATE or
//! DELETE statement. It renders nothing by itself; executors turn it into SQL
//! (`SqlGenerator`) or evaluate it in memory.

use crate::errors::QueryError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::{JoinClause, JoinType, TableRef};
use crate::query_builder::ordering::OrderBy;
use crate::query_builder::pagination::PageRequest;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::query_builder::update::UpdateSet;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) select: Vec<SelectField>,
    pub(crate) from: Option<TableRef>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) group_by: Option<GroupBy>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) update_set: Option<UpdateSet>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the projection
    pub fn select(mut self, fields: Vec<SelectField>) -> Self {
        self.select = fields;
        self
    }

    pub fn from(mut self, table: &str, alias: &str) -> Self {
        self.from = Some(TableRef::aliased(table, alias));
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// `LEFT JOIN table AS alias ON left_field = right_field`
    pub fn left_join(self, table: &str, alias: &str, left_field: &str, right_field: &str) -> Self {
        self.join(JoinClause::new_on(JoinType::Left, table, left_field, right_field).with_alias(alias))
    }

    /// `INNER JOIN table AS alias ON left_field = right_field`
    pub fn inner_join(self, table: &str, alias: &str, left_field: &str, right_field: &str) -> Self {
        self.join(JoinClause::new_on(JoinType::Inner, table, left_field, right_field).with_alias(alias))
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    /// Add every present filter (combined with AND); absent ones are skipped
    pub fn filter_all(mut self, filters: impl IntoIterator<Item = Option<QueryFilter>>) -> Self {
        self.conditions.extend(filters.into_iter().flatten());
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Apply a page request: its sort keys, then offset and limit
    pub fn paginate(mut self, request: &PageRequest) -> Result<Self, QueryError> {
        let offset = request.offset().ok_or_else(|| {
            QueryError::invalid(format!(
                "page {} of size {} has no valid offset",
                request.page, request.size
            ))
        })?;
        self.order_by.extend(request.sort.iter().cloned());
        Ok(self.offset(offset).limit(request.size))
    }

    /// Turn this query into a bulk UPDATE of its FROM table
    pub fn set(mut self, update_set: UpdateSet) -> Self {
        self.update_set = Some(update_set);
        self
    }

    /// Query counting the rows this query matches: same FROM, joins and
    /// conditions; no projection, grouping, ordering or paging
    pub fn to_count_query(&self, count_field: &str, alias: &str) -> Self {
        Self {
            select: vec![SelectField::count(count_field).with_alias(alias)],
            from: self.from.clone(),
            joins: self.joins.clone(),
            conditions: self.conditions.clone(),
            ..Self::default()
        }
    }

    pub fn select_fields(&self) -> &[SelectField] {
        &self.select
    }

    pub fn from_table(&self) -> Option<&TableRef> {
        self.from.as_ref()
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn conditions(&self) -> &[QueryFilter] {
        &self.conditions
    }

    pub fn grouping(&self) -> Option<&GroupBy> {
        self.group_by.as_ref()
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn update_set(&self) -> Option<&UpdateSet> {
        self.update_set.as_ref()
    }

    /// Build WHERE clause and its parameter values
    pub fn build_where_clause(&self) -> Result<(String, Vec<Value>), QueryError> {
        SqlGenerator::build_where_clause(&self.conditions)
    }

    /// Build the SELECT statement and its parameter values
    pub fn build(&self) -> Result<(String, Vec<Value>), QueryError> {
        SqlGenerator::build_select(self)
    }
}
