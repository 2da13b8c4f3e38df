mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use mediaamp_core::{
    config::{self, AppConfig},
    CatalogClient, CatalogStore, Identity,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    tracing::info!(path = %config_path.display(), base_url = %config.api.base_url, "Configuration loaded");
    if config.api.key.is_empty() {
        tracing::warn!("No API key configured; catalog loads will fail until api.key is set");
    }

    let client = CatalogClient::new(&config.api).context("failed to build catalog client")?;
    let store = CatalogStore::new(client);
    let identity = Identity::from_settings(&config.identity);

    let mut app = app::MediaAmpApp::new(store, identity, config.start_page);
    app.run().await
}

// The terminal owns stdout while the UI runs, so logs only go to a file.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("mediaamp.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
