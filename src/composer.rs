//! Query composition
//!
//! Turns a `MemberSearchCondition` into the queries the repository runs.
//! Absent fragments are dropped before they reach the builder, so a
//! condition with nothing set yields an unfiltered join with no WHERE clause.

use crate::columns::{
    MEMBER_AGE, MEMBER_ALIAS, MEMBER_ID, MEMBER_TABLE, MEMBER_TEAM_ID, MEMBER_USERNAME,
    TEAM_ALIAS, TEAM_ID, TEAM_NAME, TEAM_TABLE, TOTAL,
};
use crate::condition::MemberSearchCondition;
use crate::predicates::{bulk_fragments, member_fragments};
use query_object::{GroupBy, OrderBy, PageRequest, QueryBuilder, QueryError, SelectField};

/// The five scalar columns a `MemberTeamDto` is read from
pub fn member_team_projection() -> Vec<SelectField> {
    vec![
        SelectField::field_as(MEMBER_ID, "member_id"),
        SelectField::field_as(MEMBER_USERNAME, "username"),
        SelectField::field_as(MEMBER_AGE, "age"),
        SelectField::field_as(TEAM_ID, "team_id"),
        SelectField::field_as(TEAM_NAME, "team_name"),
    ]
}

/// `SELECT <projection> FROM member m LEFT JOIN team t ON m.team_id = t.team_id WHERE <fragments>`
pub fn member_team_query(condition: &MemberSearchCondition) -> QueryBuilder {
    QueryBuilder::new()
        .select(member_team_projection())
        .from(MEMBER_TABLE, MEMBER_ALIAS)
        .left_join(TEAM_TABLE, TEAM_ALIAS, MEMBER_TEAM_ID, TEAM_ID)
        .filter_all(member_fragments(condition))
}

/// Every matching row in member id order
pub fn search_query(condition: &MemberSearchCondition) -> QueryBuilder {
    member_team_query(condition).order_by(OrderBy::asc(MEMBER_ID))
}

/// One page of matching rows: caller sort keys first, member id as the tiebreak
pub fn content_query(
    condition: &MemberSearchCondition,
    request: &PageRequest,
) -> Result<QueryBuilder, QueryError> {
    Ok(member_team_query(condition)
        .paginate(request)?
        .order_by(OrderBy::asc(MEMBER_ID)))
}

/// `SELECT COUNT(m.member_id) AS total` over the same join and fragments
pub fn count_query(condition: &MemberSearchCondition) -> QueryBuilder {
    member_team_query(condition).to_count_query(MEMBER_ID, TOTAL)
}

/// Member count and average age per team; members without a team are left out
pub fn team_statistics_query(condition: &MemberSearchCondition) -> QueryBuilder {
    QueryBuilder::new()
        .select(vec![
            SelectField::field_as(TEAM_NAME, "team_name"),
            SelectField::count(MEMBER_ID).with_alias("member_count"),
            SelectField::avg(MEMBER_AGE).with_alias("average_age"),
        ])
        .from(MEMBER_TABLE, MEMBER_ALIAS)
        .inner_join(TEAM_TABLE, TEAM_ALIAS, MEMBER_TEAM_ID, TEAM_ID)
        .filter_all(member_fragments(condition))
        .group_by(GroupBy::single(TEAM_NAME))
        .order_by(OrderBy::asc(TEAM_NAME))
}

/// The member rows a bulk UPDATE or DELETE applies to
pub fn bulk_target_query(condition: &MemberSearchCondition) -> QueryBuilder {
    QueryBuilder::new()
        .from(MEMBER_TABLE, MEMBER_ALIAS)
        .filter_all(bulk_fragments(condition))
}
