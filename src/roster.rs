//! In-process member/team data
//!
//! Membership is stored once, as member id -> team id. The team -> members
//! index is derived from it and only ever changed by `set_membership`, so
//! the two directions cannot disagree.

use crate::columns::{MEMBER_TABLE, TEAM_TABLE};
use crate::errors::RosterError;
use query_object::{QueryError, Record, TableSink, TableSource};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

const MEMBER_COLUMNS: &[&str] = &["member_id", "username", "age", "team_id"];
const TEAM_COLUMNS: &[&str] = &["team_id", "name"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: BTreeMap<i64, Member>,
    teams: BTreeMap<i64, Team>,
    membership: BTreeMap<i64, i64>,
    team_members: BTreeMap<i64, BTreeSet<i64>>,
    last_member_id: i64,
    last_team_id: i64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a team and return its id
    pub fn add_team(&mut self, name: impl Into<String>) -> i64 {
        self.last_team_id += 1;
        let team_id = self.last_team_id;
        self.teams.insert(
            team_id,
            Team {
                team_id,
                name: name.into(),
            },
        );
        self.team_members.insert(team_id, BTreeSet::new());
        team_id
    }

    /// Add a member, optionally on a team, and return its id
    pub fn add_member(
        &mut self,
        username: Option<&str>,
        age: i32,
        team_id: Option<i64>,
    ) -> Result<i64, RosterError> {
        if age < 0 {
            return Err(RosterError::NegativeAge(age));
        }
        self.check_team(team_id)?;

        self.last_member_id += 1;
        let member_id = self.last_member_id;
        self.members.insert(
            member_id,
            Member {
                member_id,
                username: username.map(str::to_string),
                age,
            },
        );
        self.set_membership(member_id, team_id);
        Ok(member_id)
    }

    /// Move a member to another team, or off any team with `None`
    pub fn change_team(&mut self, member_id: i64, team_id: Option<i64>) -> Result<(), RosterError> {
        if !self.members.contains_key(&member_id) {
            return Err(RosterError::UnknownMember(member_id));
        }
        self.check_team(team_id)?;
        self.set_membership(member_id, team_id);
        Ok(())
    }

    pub fn remove_member(&mut self, member_id: i64) -> Result<Member, RosterError> {
        let member = self
            .members
            .remove(&member_id)
            .ok_or(RosterError::UnknownMember(member_id))?;
        self.set_membership(member_id, None);
        Ok(member)
    }

    pub fn member(&self, member_id: i64) -> Option<&Member> {
        self.members.get(&member_id)
    }

    pub fn team(&self, team_id: i64) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn team_id_of(&self, member_id: i64) -> Option<i64> {
        self.membership.get(&member_id).copied()
    }

    pub fn team_of(&self, member_id: i64) -> Option<&Team> {
        self.team_id_of(member_id).and_then(|team_id| self.teams.get(&team_id))
    }

    /// Members of a team in id order
    pub fn members_of(&self, team_id: i64) -> Vec<&Member> {
        self.team_members
            .get(&team_id)
            .into_iter()
            .flatten()
            .filter_map(|member_id| self.members.get(member_id))
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    fn check_team(&self, team_id: Option<i64>) -> Result<(), RosterError> {
        match team_id {
            Some(team_id) if !self.teams.contains_key(&team_id) => {
                Err(RosterError::UnknownTeam(team_id))
            }
            _ => Ok(()),
        }
    }

    /// The only place membership changes; keeps both directions in step
    fn set_membership(&mut self, member_id: i64, team_id: Option<i64>) {
        if let Some(previous) = self.membership.remove(&member_id) {
            if let Some(members) = self.team_members.get_mut(&previous) {
                members.remove(&member_id);
            }
        }
        if let Some(team_id) = team_id {
            self.membership.insert(member_id, team_id);
            self.team_members.entry(team_id).or_default().insert(member_id);
        }
    }

    fn member_row(&self, member: &Member) -> Record {
        let mut row = Record::new();
        row.insert("member_id".to_string(), json!(member.member_id));
        row.insert("username".to_string(), json!(member.username));
        row.insert("age".to_string(), json!(member.age));
        row.insert("team_id".to_string(), json!(self.team_id_of(member.member_id)));
        row
    }

    fn update_member(&mut self, member_id: i64, changes: &Record) -> Result<(), QueryError> {
        let mut member = self
            .members
            .get(&member_id)
            .cloned()
            .ok_or(RosterError::UnknownMember(member_id))?;
        let mut team_id = self.team_id_of(member_id);

        for (column, value) in changes {
            match column.as_str() {
                "member_id" if value.as_i64() == Some(member_id) => {}
                "member_id" => {
                    return Err(QueryError::ConstraintViolation(
                        "member_id cannot be changed".to_string(),
                    ));
                }
                "username" => {
                    member.username = match value {
                        Value::Null => None,
                        Value::String(name) => Some(name.clone()),
                        other => return Err(mismatch(column, other)),
                    };
                }
                "age" => {
                    let age = value
                        .as_i64()
                        .and_then(|age| i32::try_from(age).ok())
                        .ok_or_else(|| mismatch(column, value))?;
                    if age < 0 {
                        return Err(RosterError::NegativeAge(age).into());
                    }
                    member.age = age;
                }
                "team_id" => {
                    team_id = match value {
                        Value::Null => None,
                        other => Some(other.as_i64().ok_or_else(|| mismatch(column, other))?),
                    };
                    self.check_team(team_id)?;
                }
                _ => return Err(QueryError::UnknownColumn(column.clone())),
            }
        }

        self.members.insert(member_id, member);
        self.set_membership(member_id, team_id);
        Ok(())
    }

    fn update_team(&mut self, team_id: i64, changes: &Record) -> Result<(), QueryError> {
        let mut team = self
            .teams
            .get(&team_id)
            .cloned()
            .ok_or(RosterError::UnknownTeam(team_id))?;

        for (column, value) in changes {
            match column.as_str() {
                "team_id" if value.as_i64() == Some(team_id) => {}
                "team_id" => {
                    return Err(QueryError::ConstraintViolation(
                        "team_id cannot be changed".to_string(),
                    ));
                }
                "name" => {
                    team.name = value
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| mismatch(column, value))?;
                }
                _ => return Err(QueryError::UnknownColumn(column.clone())),
            }
        }

        self.teams.insert(team_id, team);
        Ok(())
    }

    fn delete_team(&mut self, team_id: i64) -> Result<(), QueryError> {
        if self.team_members.get(&team_id).is_some_and(|members| !members.is_empty()) {
            return Err(QueryError::ConstraintViolation(format!(
                "team {} still has members",
                team_id
            )));
        }
        self.teams.remove(&team_id);
        self.team_members.remove(&team_id);
        Ok(())
    }
}

fn mismatch(column: &str, value: &Value) -> QueryError {
    QueryError::TypeMismatch(format!("{} cannot hold {}", column, value))
}

fn row_key(table: &str, key: &Value) -> Result<i64, QueryError> {
    key.as_i64()
        .ok_or_else(|| QueryError::TypeMismatch(format!("{} key {} is not an id", table, key)))
}

impl TableSource for Roster {
    fn scan(&self, table: &str) -> Result<Vec<Record>, QueryError> {
        match table {
            MEMBER_TABLE => Ok(self.members.values().map(|m| self.member_row(m)).collect()),
            TEAM_TABLE => Ok(self
                .teams
                .values()
                .map(|team| {
                    let mut row = Record::new();
                    row.insert("team_id".to_string(), json!(team.team_id));
                    row.insert("name".to_string(), json!(team.name));
                    row
                })
                .collect()),
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }

    fn columns(&self, table: &str) -> Result<&'static [&'static str], QueryError> {
        match table {
            MEMBER_TABLE => Ok(MEMBER_COLUMNS),
            TEAM_TABLE => Ok(TEAM_COLUMNS),
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }

    fn primary_key(&self, table: &str) -> Result<&'static str, QueryError> {
        match table {
            MEMBER_TABLE => Ok("member_id"),
            TEAM_TABLE => Ok("team_id"),
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }
}

impl TableSink for Roster {
    fn update_row(&mut self, table: &str, key: &Value, changes: &Record) -> Result<(), QueryError> {
        match table {
            MEMBER_TABLE => self.update_member(row_key(table, key)?, changes),
            TEAM_TABLE => self.update_team(row_key(table, key)?, changes),
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }

    fn delete_row(&mut self, table: &str, key: &Value) -> Result<(), QueryError> {
        match table {
            MEMBER_TABLE => {
                self.remove_member(row_key(table, key)?)?;
                Ok(())
            }
            TEAM_TABLE => self.delete_team(row_key(table, key)?),
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_teams() -> (Roster, i64, i64) {
        let mut roster = Roster::new();
        let team_a = roster.add_team("teamA");
        let team_b = roster.add_team("teamB");
        (roster, team_a, team_b)
    }

    #[test]
    fn test_change_team_keeps_index_in_step() {
        let (mut roster, team_a, team_b) = two_teams();
        let member = roster.add_member(Some("member1"), 10, Some(team_a)).unwrap();
        assert_eq!(roster.members_of(team_a).len(), 1);

        roster.change_team(member, Some(team_b)).unwrap();
        assert!(roster.members_of(team_a).is_empty());
        assert_eq!(roster.members_of(team_b)[0].member_id, member);
        assert_eq!(roster.team_of(member).map(|t| t.name.as_str()), Some("teamB"));

        roster.change_team(member, None).unwrap();
        assert!(roster.members_of(team_b).is_empty());
        assert_eq!(roster.team_of(member), None);
    }

    #[test]
    fn test_rejected_mutations() {
        let (mut roster, team_a, _) = two_teams();
        assert_eq!(
            roster.add_member(Some("member1"), -1, None),
            Err(RosterError::NegativeAge(-1))
        );
        assert_eq!(
            roster.add_member(Some("member1"), 10, Some(99)),
            Err(RosterError::UnknownTeam(99))
        );
        assert_eq!(roster.change_team(42, Some(team_a)), Err(RosterError::UnknownMember(42)));
        assert_eq!(roster.member_count(), 0);
    }

    #[test]
    fn test_remove_member_leaves_team() {
        let (mut roster, team_a, _) = two_teams();
        let member = roster.add_member(Some("member1"), 10, Some(team_a)).unwrap();
        let removed = roster.remove_member(member).unwrap();
        assert_eq!(removed.username.as_deref(), Some("member1"));
        assert!(roster.members_of(team_a).is_empty());
        assert_eq!(roster.remove_member(member), Err(RosterError::UnknownMember(member)));
    }

    #[test]
    fn test_scan_exposes_membership_as_foreign_key() {
        let (mut roster, team_a, _) = two_teams();
        roster.add_member(Some("member1"), 10, Some(team_a)).unwrap();
        roster.add_member(None, 20, None).unwrap();

        let rows = roster.scan("member").unwrap();
        assert_eq!(rows[0]["team_id"], json!(team_a));
        assert_eq!(rows[1]["team_id"], Value::Null);
        assert_eq!(rows[1]["username"], Value::Null);
        assert!(matches!(roster.scan("squad"), Err(QueryError::UnknownTable(_))));
    }

    #[test]
    fn test_row_updates_are_checked() {
        let (mut roster, team_a, team_b) = two_teams();
        let member = roster.add_member(Some("member1"), 10, Some(team_a)).unwrap();

        let mut changes = Record::new();
        changes.insert("team_id".to_string(), json!(team_b));
        changes.insert("age".to_string(), json!(11));
        roster.update_row("member", &json!(member), &changes).unwrap();
        assert_eq!(roster.member(member).map(|m| m.age), Some(11));
        assert_eq!(roster.members_of(team_b).len(), 1);

        let mut negative = Record::new();
        negative.insert("age".to_string(), json!(-5));
        assert!(matches!(
            roster.update_row("member", &json!(member), &negative),
            Err(QueryError::ConstraintViolation(_))
        ));

        let mut dangling = Record::new();
        dangling.insert("team_id".to_string(), json!(99));
        assert!(matches!(
            roster.update_row("member", &json!(member), &dangling),
            Err(QueryError::ConstraintViolation(_))
        ));

        let mut renumber = Record::new();
        renumber.insert("member_id".to_string(), json!(member + 1));
        assert!(matches!(
            roster.update_row("member", &json!(member), &renumber),
            Err(QueryError::ConstraintViolation(_))
        ));
        assert_eq!(roster.member(member).map(|m| m.age), Some(11));
    }

    #[test]
    fn test_team_with_members_cannot_be_deleted() {
        let (mut roster, team_a, team_b) = two_teams();
        roster.add_member(Some("member1"), 10, Some(team_a)).unwrap();
        assert!(matches!(
            roster.delete_row("team", &json!(team_a)),
            Err(QueryError::ConstraintViolation(_))
        ));
        roster.delete_row("team", &json!(team_b)).unwrap();
        assert!(roster.team(team_b).is_none());
    }
}
