//! Predicate fragments
//!
//! One function per filterable field. Each maps an optional filter value to
//! either no constraint (`None`) or a single condition.

use crate::columns::{MEMBER_AGE, MEMBER_TEAM_ID, MEMBER_USERNAME, TEAM_ALIAS, TEAM_ID, TEAM_NAME, TEAM_TABLE};
use crate::condition::MemberSearchCondition;
use query_object::{QueryBuilder, QueryFilter, SelectField};
use serde_json::json;

/// The value itself when it holds at least one non-whitespace character
pub fn has_text(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn username_eq(username: Option<&str>) -> Option<QueryFilter> {
    has_text(username).map(|username| QueryFilter::eq(MEMBER_USERNAME, json!(username)))
}

pub fn team_name_eq(team_name: Option<&str>) -> Option<QueryFilter> {
    has_text(team_name).map(|team_name| QueryFilter::eq(TEAM_NAME, json!(team_name)))
}

pub fn age_goe(min: Option<i32>) -> Option<QueryFilter> {
    min.map(|min| QueryFilter::gte(MEMBER_AGE, json!(min)))
}

pub fn age_loe(max: Option<i32>) -> Option<QueryFilter> {
    max.map(|max| QueryFilter::lte(MEMBER_AGE, json!(max)))
}

/// Team-name constraint for statements that cannot join team:
/// `m.team_id IN (SELECT t.team_id FROM team AS t WHERE t.name = ?)`
pub fn team_name_in(team_name: Option<&str>) -> Option<QueryFilter> {
    team_name_eq(team_name).map(|name_filter| {
        let team_ids = QueryBuilder::new()
            .select(vec![SelectField::field(TEAM_ID)])
            .from(TEAM_TABLE, TEAM_ALIAS)
            .filter(name_filter);
        QueryFilter::in_subquery(MEMBER_TEAM_ID, team_ids)
    })
}

/// Every fragment of `condition`, for queries joining member to team
pub fn member_fragments(condition: &MemberSearchCondition) -> Vec<Option<QueryFilter>> {
    vec![
        username_eq(condition.username.as_deref()),
        team_name_eq(condition.team_name.as_deref()),
        age_goe(condition.age_goe),
        age_loe(condition.age_loe),
    ]
}

/// Every fragment of `condition`, for statements on the member table alone
pub fn bulk_fragments(condition: &MemberSearchCondition) -> Vec<Option<QueryFilter>> {
    vec![
        username_eq(condition.username.as_deref()),
        team_name_in(condition.team_name.as_deref()),
        age_goe(condition.age_goe),
        age_loe(condition.age_loe),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_no_constraint() {
        assert_eq!(username_eq(None), None);
        assert_eq!(username_eq(Some("")), None);
        assert_eq!(username_eq(Some("  \t")), None);
        assert_eq!(team_name_eq(Some(" ")), None);
        assert_eq!(team_name_in(Some("")), None);
    }

    #[test]
    fn test_present_values_become_conditions() {
        assert_eq!(
            username_eq(Some("member1")),
            Some(QueryFilter::eq("m.username", json!("member1")))
        );
        assert_eq!(
            team_name_eq(Some("teamA")),
            Some(QueryFilter::eq("t.name", json!("teamA")))
        );
        assert_eq!(age_goe(Some(25)), Some(QueryFilter::gte("m.age", json!(25))));
        assert_eq!(age_loe(Some(0)), Some(QueryFilter::lte("m.age", json!(0))));
        assert_eq!(age_goe(None), None);
    }

    #[test]
    fn test_team_name_subquery_renders() {
        let query = QueryBuilder::new()
            .from("member", "m")
            .filter_all([team_name_in(Some("teamB"))]);
        let (sql, params) = query.build().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM member AS m WHERE m.team_id IN \
             (SELECT t.team_id FROM team AS t WHERE t.name = $1)"
        );
        assert_eq!(params, vec![json!("teamB")]);
    }

    #[test]
    fn test_fragments_follow_condition() {
        let condition = MemberSearchCondition::new().team_name("teamA").age_loe(30);
        let present: Vec<_> = member_fragments(&condition).into_iter().flatten().collect();
        assert_eq!(present.len(), 2);

        let bulk = bulk_fragments(&condition);
        assert!(matches!(bulk[1], Some(QueryFilter::InSubquery { .. })));
        assert!(bulk[0].is_none());
    }
}
