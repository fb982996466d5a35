//! SQL rendering tests for the query builder

use crate::errors::QueryError;
use crate::query_builder::{
    GroupBy, JoinClause, JoinType, OrderBy, PageRequest, QueryBuilder, QueryFilter,
    SelectField, SqlGenerator, UpdateSet,
};
use serde_json::json;

fn member_team_query() -> QueryBuilder {
    QueryBuilder::new()
        .select(vec![
            SelectField::field_as("m.member_id", "member_id"),
            SelectField::field("m.username"),
            SelectField::field_as("t.name", "team_name"),
        ])
        .from("member", "m")
        .left_join("team", "t", "m.team_id", "t.team_id")
}

// ========================================
// SELECT rendering
// ========================================

#[test]
fn test_select_without_conditions_has_no_where_clause() {
    let (sql, params) = member_team_query().build().unwrap();

    assert_eq!(
        sql,
        "SELECT m.member_id AS member_id, m.username, t.name AS team_name \
         FROM member AS m LEFT JOIN team AS t ON m.team_id = t.team_id"
    );
    assert!(params.is_empty());
}

#[test]
fn test_conditions_are_anded_and_numbered_in_order() {
    let query = member_team_query()
        .filter(QueryFilter::eq("m.username", json!("member1")))
        .filter(QueryFilter::eq("t.name", json!("teamA")))
        .filter(QueryFilter::gte("m.age", json!(10)))
        .filter(QueryFilter::lte("m.age", json!(40)));

    let (sql, params) = query.build().unwrap();

    assert!(sql.ends_with(
        "WHERE m.username = $1 AND t.name = $2 AND m.age >= $3 AND m.age <= $4"
    ));
    assert_eq!(params, vec![json!("member1"), json!("teamA"), json!(10), json!(40)]);
}

#[test]
fn test_absent_filters_are_skipped_entirely() {
    let query = member_team_query().filter_all([
        None,
        Some(QueryFilter::eq("t.name", json!("teamB"))),
        None,
    ]);

    let (sql, params) = query.build().unwrap();
    assert!(sql.ends_with("WHERE t.name = $1"));
    assert!(!sql.contains("1=1"));
    assert_eq!(params, vec![json!("teamB")]);

    let (sql, _) = member_team_query().filter_all([None, None]).build().unwrap();
    assert!(!sql.contains("WHERE"));
}

#[test]
fn test_nested_groups_and_negation() {
    let query = QueryBuilder::new().from("member", "m").filter(QueryFilter::and(vec![
        QueryFilter::or(vec![
            QueryFilter::eq("m.username", json!("member1")),
            QueryFilter::is_null("m.username"),
        ]),
        QueryFilter::not(QueryFilter::between("m.age", json!(20), json!(40))),
        QueryFilter::and(vec![]),
    ]));

    let (sql, params) = query.build().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM member AS m WHERE ((m.username = $1 OR m.username IS NULL) \
         AND NOT (m.age BETWEEN $2 AND $3))"
    );
    assert_eq!(params, vec![json!("member1"), json!(20), json!(40)]);
}

#[test]
fn test_in_lists() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::in_values("m.age", vec![json!(10), json!(20)]))
        .filter(QueryFilter::not_in_values("m.username", vec![]));

    let (sql, params) = query.build().unwrap();
    assert_eq!(sql, "SELECT * FROM member AS m WHERE m.age IN ($1, $2)");
    assert_eq!(params.len(), 2);

    let empty = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::in_values("m.age", vec![]));
    let (sql, _) = empty.build().unwrap();
    assert!(sql.ends_with("WHERE 1=0"));
}

#[test]
fn test_subquery_parameters_continue_numbering() {
    let teams = QueryBuilder::new()
        .select(vec![SelectField::field("t.team_id")])
        .from("team", "t")
        .filter(QueryFilter::eq("t.name", json!("teamA")));

    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::gt("m.age", json!(18)))
        .filter(QueryFilter::in_subquery("m.team_id", teams));

    let (sql, params) = query.build().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM member AS m WHERE m.age > $1 AND m.team_id IN \
         (SELECT t.team_id FROM team AS t WHERE t.name = $2)"
    );
    assert_eq!(params, vec![json!(18), json!("teamA")]);
}

#[test]
fn test_ordering_and_pagination() {
    let request = PageRequest::new(2, 10).with_sort(OrderBy::desc("m.age").nulls_last());
    let query = member_team_query()
        .paginate(&request)
        .unwrap()
        .order_by(OrderBy::asc("m.member_id"));

    let (sql, _) = query.build().unwrap();
    assert!(sql.ends_with(
        "ORDER BY m.age DESC NULLS LAST, m.member_id ASC LIMIT 10 OFFSET 20"
    ));
}

#[test]
fn test_paginate_rejects_malformed_requests() {
    let result = member_team_query().paginate(&PageRequest::new(-1, 10));
    assert!(matches!(result, Err(QueryError::InvalidQuery(_))));
}

#[test]
fn test_grouped_aggregates() {
    let query = QueryBuilder::new()
        .select(vec![
            SelectField::field_as("t.name", "team_name"),
            SelectField::count("m.member_id").with_alias("member_count"),
            SelectField::avg("m.age").with_alias("average_age"),
        ])
        .from("member", "m")
        .join(JoinClause::new_on(JoinType::Inner, "team", "m.team_id", "t.team_id").with_alias("t"))
        .group_by(GroupBy::single("t.name"))
        .order_by(OrderBy::asc("t.name"));

    let (sql, _) = query.build().unwrap();
    assert_eq!(
        sql,
        "SELECT t.name AS team_name, COUNT(m.member_id) AS member_count, \
         AVG(m.age) AS average_age FROM member AS m \
         INNER JOIN team AS t ON m.team_id = t.team_id GROUP BY t.name ORDER BY t.name ASC"
    );
}

#[test]
fn test_count_query_drops_projection_and_paging() {
    let query = member_team_query()
        .filter(QueryFilter::eq("t.name", json!("teamA")))
        .order_by(OrderBy::asc("m.member_id"))
        .limit(5)
        .offset(10);

    let (sql, params) = query.to_count_query("m.member_id", "total").build().unwrap();
    assert_eq!(
        sql,
        "SELECT COUNT(m.member_id) AS total FROM member AS m \
         LEFT JOIN team AS t ON m.team_id = t.team_id WHERE t.name = $1"
    );
    assert_eq!(params, vec![json!("teamA")]);
}

#[test]
fn test_cross_join_has_no_on_clause() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .join(JoinClause::new_on(JoinType::Cross, "team", "m.team_id", "t.team_id").with_alias("t"))
        .filter(QueryFilter::condition(
            "m.username",
            crate::query_builder::QueryOperator::Eq,
            Some(json!("teamA")),
        ));

    let (sql, _) = query.build().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM member AS m CROSS JOIN team AS t WHERE m.username = $1"
    );
}

// ========================================
// Identifier and value validation
// ========================================

#[test]
fn test_injection_through_identifiers_is_rejected() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::eq("m.age; DROP TABLE member", json!(1)));
    assert!(matches!(query.build(), Err(QueryError::Validation(_))));

    let query = QueryBuilder::new().from("member; --", "m");
    assert!(matches!(query.build(), Err(QueryError::Validation(_))));

    let query = member_team_query().order_by(OrderBy::asc("m.age DESC"));
    assert!(matches!(query.build(), Err(QueryError::Validation(_))));
}

#[test]
fn test_injection_through_values_is_bound() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::eq("m.username", json!("'; DROP TABLE member; --")));

    let (sql, params) = query.build().unwrap();
    assert!(!sql.contains("DROP"));
    assert_eq!(params, vec![json!("'; DROP TABLE member; --")]);
}

#[test]
fn test_missing_values_are_errors() {
    let query = QueryBuilder::new().from("member", "m").filter(QueryFilter::condition(
        "m.age",
        crate::query_builder::QueryOperator::Gte,
        None,
    ));
    assert!(matches!(query.build(), Err(QueryError::InvalidQuery(_))));

    let query = QueryBuilder::new().from("member", "m").filter(QueryFilter::condition(
        "m.age",
        crate::query_builder::QueryOperator::Between,
        Some(json!([1])),
    ));
    assert!(matches!(query.build(), Err(QueryError::InvalidQuery(_))));

    assert!(matches!(QueryBuilder::new().build(), Err(QueryError::InvalidQuery(_))));
}

#[test]
fn test_equality_with_missing_value_means_null_check() {
    let query = QueryBuilder::new().from("member", "m").filter(QueryFilter::condition(
        "m.team_id",
        crate::query_builder::QueryOperator::Eq,
        None,
    ));
    let (sql, params) = query.build().unwrap();
    assert!(sql.ends_with("WHERE m.team_id IS NULL"));
    assert!(params.is_empty());
}

#[test]
fn test_build_where_clause() {
    let (where_clause, values) = SqlGenerator::build_where_clause(&[
        QueryFilter::lt("m.age", json!(28)),
        QueryFilter::or(vec![]),
    ])
    .unwrap();
    assert_eq!(where_clause, "WHERE m.age < $1");
    assert_eq!(values, vec![json!(28)]);

    let (where_clause, values) = SqlGenerator::build_where_clause(&[]).unwrap();
    assert!(where_clause.is_empty());
    assert!(values.is_empty());
}

// ========================================
// Bulk statements
// ========================================

#[test]
fn test_bulk_update() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::lt("m.age", json!(28)))
        .set(UpdateSet::new().set("username", json!("guest")).increment("age", json!(1)));

    let (sql, params) = SqlGenerator::build_update(&query).unwrap();
    assert_eq!(
        sql,
        "UPDATE member AS m SET age = age + $1, username = $2 WHERE m.age < $3"
    );
    assert_eq!(params, vec![json!(1), json!("guest"), json!(28)]);
}

#[test]
fn test_bulk_update_requires_assignments_and_no_joins() {
    let empty = QueryBuilder::new().from("member", "m").set(UpdateSet::new());
    assert!(matches!(
        SqlGenerator::build_update(&empty),
        Err(QueryError::InvalidQuery(_))
    ));

    let joined = member_team_query().set(UpdateSet::new().set("age", json!(0)));
    assert!(matches!(
        SqlGenerator::build_update(&joined),
        Err(QueryError::InvalidQuery(_))
    ));

    let qualified = QueryBuilder::new()
        .from("member", "m")
        .set(UpdateSet::new().set("m.age", json!(0)));
    assert!(matches!(
        SqlGenerator::build_update(&qualified),
        Err(QueryError::Validation(_))
    ));
}

#[test]
fn test_bulk_delete() {
    let query = QueryBuilder::new()
        .from("member", "m")
        .filter(QueryFilter::gt("m.age", json!(18)));

    let (sql, params) = SqlGenerator::build_delete(&query).unwrap();
    assert_eq!(sql, "DELETE FROM member AS m WHERE m.age > $1");
    assert_eq!(params, vec![json!(18)]);

    let all = QueryBuilder::new().from("member", "m");
    let (sql, params) = SqlGenerator::build_delete(&all).unwrap();
    assert_eq!(sql, "DELETE FROM member AS m");
    assert!(params.is_empty());
}

#[test]
fn test_numbered_select_validates_ordinal_name() {
    let result = SqlGenerator::build_select_numbered(&member_team_query(), "n; DROP TABLE member");
    assert!(matches!(result, Err(QueryError::Validation(_))));

    let (sql, _) = SqlGenerator::build_select_numbered(
        &member_team_query().order_by(OrderBy::asc("m.member_id")),
        "position",
    )
    .unwrap();
    assert!(sql.contains("ROW_NUMBER() OVER (ORDER BY m.member_id ASC) AS position FROM member AS m"));
    assert!(sql.ends_with("ORDER BY m.member_id ASC"));
}
