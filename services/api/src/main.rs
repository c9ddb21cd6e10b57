use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use common::database::{self, DatabaseConfig};
use common::pagination::PageNumberPagination;
use tokio::net::TcpListener;
use url::Url;

use crate::{
    config::Settings,
    middleware::TokenVerifier,
    repositories::{CustomerRepository, ProductRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting API service");

    let settings = Settings::from_env()?;
    let public_base_url = Url::parse(&settings.public_base_url)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    if settings.run_migrations {
        database::run_migrations(&pool).await?;
    }

    let verifier = TokenVerifier::from_env()?;

    let app_state = AppState {
        product_repository: ProductRepository::new(pool.clone()),
        customer_repository: CustomerRepository::new(pool),
        pagination: PageNumberPagination::new(settings.page_size),
        public_base_url,
    };

    info!(
        page_size = app_state.pagination.page_size(),
        "API service initialized successfully"
    );

    // Start the web server
    let app = routes::create_router(app_state, verifier);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!("API service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
