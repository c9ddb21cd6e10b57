//! Service settings loaded from `API_*` environment variables

use common::pagination::DEFAULT_PAGE_SIZE;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// API service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Listen address (`API_BIND_ADDR`, default `0.0.0.0:3001`)
    pub bind_addr: String,
    /// Items per listing page (`API_PAGE_SIZE`, default 10)
    pub page_size: usize,
    /// Absolute base for pagination links (`API_PUBLIC_BASE_URL`)
    pub public_base_url: String,
    /// Apply migrations at startup (`API_RUN_MIGRATIONS`)
    pub run_migrations: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .set_default("page_size", DEFAULT_PAGE_SIZE as i64)?
            .set_default("public_base_url", "http://localhost:3001")?
            .set_default("run_migrations", true)?
            .add_source(Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "API_BIND_ADDR",
        "API_PAGE_SIZE",
        "API_PUBLIC_BASE_URL",
        "API_RUN_MIGRATIONS",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults() {
        clear_env();

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:3001");
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.public_base_url, "http://localhost:3001");
        assert!(settings.run_migrations);
    }

    #[test]
    #[serial]
    fn page_size_comes_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("API_PAGE_SIZE", "25");
            std::env::set_var("API_PUBLIC_BASE_URL", "https://shop.example.com");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.public_base_url, "https://shop.example.com");

        clear_env();
    }
}
