//! Table, alias and column names of the member/team schema

pub const MEMBER_TABLE: &str = "member";
pub const MEMBER_ALIAS: &str = "m";
pub const TEAM_TABLE: &str = "team";
pub const TEAM_ALIAS: &str = "t";

pub const MEMBER_ID: &str = "m.member_id";
pub const MEMBER_USERNAME: &str = "m.username";
pub const MEMBER_AGE: &str = "m.age";
pub const MEMBER_TEAM_ID: &str = "m.team_id";

pub const TEAM_ID: &str = "t.team_id";
pub const TEAM_NAME: &str = "t.name";

/// Alias of the count column in count queries
pub const TOTAL: &str = "total";
