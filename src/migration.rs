//! Schema creation and seeding
//!
//! Creates the `team` and `member` tables and copies an in-process
//! `Roster` into them, keeping its ids.

use crate::core::RosterSearch;
use crate::errors::RosterSearchError;
use crate::roster::Roster;

const CREATE_TEAM_SQL: &str = "CREATE TABLE IF NOT EXISTS team (
    team_id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL
)";

const CREATE_MEMBER_SQL: &str = "CREATE TABLE IF NOT EXISTS member (
    member_id BIGSERIAL PRIMARY KEY,
    username TEXT NULL,
    age INTEGER NOT NULL CHECK (age >= 0),
    team_id BIGINT NULL REFERENCES team(team_id)
)";

const CREATE_INDEXES_SQL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_member_team_id ON member (team_id)",
    "CREATE INDEX IF NOT EXISTS idx_member_username ON member (username)",
    "CREATE INDEX IF NOT EXISTS idx_team_name ON team (name)",
];

impl RosterSearch {
    /// Create the member and team tables and their indexes.
    /// If recreate is true, drops existing tables first
    pub async fn auto_migrate(&self, recreate: bool) -> Result<(), RosterSearchError> {
        if recreate {
            tracing::info!("dropping tables member, team");
            sqlx::query("DROP TABLE IF EXISTS member")
                .execute(self.pool())
                .await?;
            sqlx::query("DROP TABLE IF EXISTS team")
                .execute(self.pool())
                .await?;
        }

        tracing::info!("creating table team");
        sqlx::query(CREATE_TEAM_SQL).execute(self.pool()).await?;

        tracing::info!("creating table member");
        sqlx::query(CREATE_MEMBER_SQL).execute(self.pool()).await?;

        for index_sql in CREATE_INDEXES_SQL {
            debug_log!("Creating index with SQL: {}", index_sql);
            sqlx::query(index_sql).execute(self.pool()).await?;
        }

        Ok(())
    }

    /// Insert every team and member of `roster` in one transaction, then
    /// move the id sequences past the inserted ids
    pub async fn seed(&self, roster: &Roster) -> Result<(), RosterSearchError> {
        let mut tx = self.pool().begin().await?;

        for team in roster.teams() {
            sqlx::query("INSERT INTO team (team_id, name) VALUES ($1, $2)")
                .bind(team.team_id)
                .bind(&team.name)
                .execute(&mut *tx)
                .await?;
        }

        for member in roster.members() {
            sqlx::query(
                "INSERT INTO member (member_id, username, age, team_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(member.member_id)
            .bind(&member.username)
            .bind(member.age)
            .bind(roster.team_id_of(member.member_id))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('team', 'team_id'), \
             COALESCE(MAX(team_id), 0) + 1, false) FROM team",
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('member', 'member_id'), \
             COALESCE(MAX(member_id), 0) + 1, false) FROM member",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            members = roster.member_count(),
            "seeded member and team tables"
        );
        Ok(())
    }
}
