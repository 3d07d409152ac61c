use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the connection pool the request pipeline draws from
pub struct DatabaseManager;

impl DatabaseManager {
    pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
    }

    /// Create a pool that connects on first use, so the server starts even when the
    /// database is not reachable yet.
    pub fn lazy_pool(config: &DatabaseConfig) -> PgPool {
        Self::lazy_pool_with(Self::connect_options(config), config)
    }

    pub fn lazy_pool_with(options: PgConnectOptions, config: &DatabaseConfig) -> PgPool {
        info!(
            "Database pool for {}@{}:{}/{} (max {} connections)",
            config.user, config.host, config.port, config.name, config.max_connections
        );
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy_with(options)
    }

    /// Pings the database through the pool
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn connect_options_follow_config() {
        let mut config = AppConfig::default().database;
        config.host = "db.internal".to_string();
        config.port = 6543;
        config.name = "tracker".to_string();

        let options = DatabaseManager::connect_options(&config);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("tracker"));
        assert_eq!(options.get_username(), "postgres");
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let config = AppConfig::default().database;
        let pool = DatabaseManager::lazy_pool(&config);
        assert_eq!(pool.size(), 0);
    }
}
