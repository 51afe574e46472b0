pub mod api; // HTTP trigger surface
pub mod config;
pub mod db;
pub mod models;
pub mod qof; // QOF achievement calculator
pub mod recall; // Due-review scanner + daily trigger
pub mod validation;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::db::DatabaseError;
use crate::qof::{IndicatorCatalogue, QofError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] QofError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Starting {} v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = AppConfig::from_env()?;

    if let Some(parent) = app_config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Migrate once up front; requests and the scheduler open their own connections.
    db::open_database(&app_config.db_path)?;
    tracing::info!(path = %app_config.db_path.display(), "Database ready");

    let catalogue = match &app_config.catalogue_path {
        Some(path) => IndicatorCatalogue::load(path)?,
        None => IndicatorCatalogue::builtin()?,
    };
    tracing::info!(
        diseases = catalogue.disease_types().count(),
        "Indicator catalogue loaded"
    );

    let _scheduler = recall::start_recall_scheduler(
        app_config.db_path.clone(),
        app_config.recall.clone(),
    );

    let ctx = api::ApiContext::new(
        app_config.db_path.clone(),
        catalogue,
        app_config.recall.clone(),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::serve_until_ctrl_c(ctx, app_config.addr))?;

    tracing::info!("Shutting down");
    Ok(())
}
