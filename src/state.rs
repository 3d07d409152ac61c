use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{AllowedHosts, AppConfig};
use crate::database::DatabaseManager;

/// Shared per-process state handed to middleware and handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub allowed_hosts: Arc<AllowedHosts>,
}

impl AppState {
    pub fn new(pool: PgPool, allowed_hosts: AllowedHosts) -> Self {
        Self {
            pool,
            allowed_hosts: Arc::new(allowed_hosts),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DatabaseManager::lazy_pool(&config.database),
            config.security.allowed_hosts.clone(),
        )
    }
}
