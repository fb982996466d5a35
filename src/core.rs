//! Core roster-search coordination
//!
//! `RosterSearch` owns the PostgreSQL pool and hands out repositories that
//! share it.

use sqlx::PgPool;
use std::time::Duration;

use crate::errors::RosterSearchError;
use crate::repository::MemberRepository;
use config::{AppConfig, SearchConfig};
use query_object::PgExecutor;

/// Main coordinator that manages the database connection
pub struct RosterSearch {
    pool: PgPool,
    search: SearchConfig,
}

impl RosterSearch {
    /// Connect using the database section of `config`
    pub async fn new(config: &AppConfig) -> Result<Self, RosterSearchError> {
        let database = &config.database;
        let connection_string = database.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(database.max_connections)
            .min_connections(database.min_connections)
            .acquire_timeout(Duration::from_secs(database.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(database.idle_timeout_seconds));

        // Set max lifetime if specified
        if database.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(database.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;
        tracing::info!(
            host = %database.host,
            database = %database.database,
            max_connections = database.max_connections,
            "connected to PostgreSQL"
        );

        Ok(Self::from_pool(pool, config.search.clone()))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, search: SearchConfig) -> Self {
        Self { pool, search }
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Member repository running on this pool with the configured search settings
    pub fn repository(&self) -> MemberRepository<PgExecutor> {
        MemberRepository::with_config(PgExecutor::new(self.pool.clone()), self.search.clone())
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), RosterSearchError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
