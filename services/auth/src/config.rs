//! Service settings loaded from `AUTH_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Which user store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Authentication service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Listen address (`AUTH_BIND_ADDR`, default `0.0.0.0:3000`)
    pub bind_addr: String,
    /// User store (`AUTH_STORE`, `postgres` or `memory`)
    pub store: StoreKind,
    /// Apply migrations at startup (`AUTH_RUN_MIGRATIONS`)
    pub run_migrations: bool,
    /// Superuser created at startup if missing (`AUTH_SUPERUSER_EMAIL`)
    pub superuser_email: Option<String>,
    /// Password for the bootstrap superuser (`AUTH_SUPERUSER_PASSWORD`)
    pub superuser_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("store", "postgres")?
            .set_default("run_migrations", true)?
            .add_source(Environment::with_prefix("AUTH").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
