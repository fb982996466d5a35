//! Result projections

use query_object::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One member joined with its team; team fields are `None` for members without a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTeamDto {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

impl MemberTeamDto {
    pub fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub team_name: String,
    pub member_count: i64,
    /// `None` only for a team whose members all lack an age, which the schema forbids
    pub average_age: Option<f64>,
}

impl TeamStatistics {
    pub fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_member_without_team() {
        let dto = MemberTeamDto::from_record(record(json!({
            "member_id": 4,
            "username": "member4",
            "age": 40,
            "team_id": null,
            "team_name": null
        })))
        .unwrap();
        assert_eq!(dto.team_id, None);
        assert_eq!(dto.team_name, None);
        assert_eq!(dto.age, 40);
    }

    #[test]
    fn test_mapping_failure_is_reported() {
        let result = MemberTeamDto::from_record(record(json!({
            "member_id": "one",
            "username": null,
            "age": 10
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_statistics_from_numeric_average() {
        let stats = TeamStatistics::from_record(record(json!({
            "team_name": "teamA",
            "member_count": 2,
            "average_age": 15.0
        })))
        .unwrap();
        assert_eq!(stats.member_count, 2);
        assert_eq!(stats.average_age, Some(15.0));
    }
}
