use std::sync::Arc;
use std::time::Duration;

use pvquote_core::config::{AppConfig, ConfigError, LoadOptions};
use pvquote_db::{connect_with_settings, migrations, CachedPriceCatalog, DbPool};
use thiserror::Error;
use tracing::info;

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<CachedPriceCatalog>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!("starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!("database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!("database migrations applied");

    let catalog = Arc::new(CachedPriceCatalog::new(
        db_pool.clone(),
        Duration::from_secs(config.catalog.cache_ttl_secs),
    ));

    Ok(Application { config, db_pool, catalog })
}

impl Application {
    pub fn api_state(&self) -> AppState {
        AppState {
            db_pool: self.db_pool.clone(),
            catalog: self.catalog.clone(),
            api_token: self.config.integration.api_token.clone(),
        }
    }
}
