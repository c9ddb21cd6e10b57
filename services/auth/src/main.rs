use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use common::database::{self, DatabaseConfig};
use tokio::net::TcpListener;

use crate::{
    config::{Settings, StoreKind},
    jwt::{JwtConfig, JwtService},
    models::NewUser,
    repositories::{MemoryUserStore, PgUserStore, UserStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting authentication service");

    let settings = Settings::from_env()?;

    let users: Arc<dyn UserStore> = match settings.store {
        StoreKind::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            if !database::health_check(&pool).await? {
                anyhow::bail!("Failed to connect to database");
            }
            info!("Database connection successful");

            if settings.run_migrations {
                database::run_migrations(&pool).await?;
            }

            Arc::new(PgUserStore::new(pool))
        }
        StoreKind::Memory => {
            warn!("Using the in-memory user store; accounts are lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    bootstrap_superuser(&settings, users.as_ref()).await?;

    // Initialize JWT service
    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let app_state = AppState { users, jwt_service };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!("Authentication service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the configured superuser unless an account with that email exists
async fn bootstrap_superuser(settings: &Settings, users: &dyn UserStore) -> Result<()> {
    let (Some(email), Some(password)) = (&settings.superuser_email, &settings.superuser_password)
    else {
        return Ok(());
    };

    if users.find_by_email(email).await?.is_some() {
        info!("Superuser {} already exists", email);
        return Ok(());
    }

    let user = users
        .create(&NewUser::new(email.clone(), password.clone()).superuser())
        .await?;
    info!("Created superuser {}", user.email);

    Ok(())
}
