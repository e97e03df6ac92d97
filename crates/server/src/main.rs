use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

mod config;
mod error;
mod handlers;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "khata_server=debug,khata_import=info,tower_http=debug".into()),
        )
        .init();

    let config = config::ServerConfig::load(Path::new("khata.toml"))
        .context("Failed to load configuration")?;

    if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).context("Failed to create database directory")?;
    }
    let db = khata_storage::create_db(&config.database_path)
        .await
        .context("Failed to open database")?;

    let state = Arc::new(handlers::AppState { db });
    let app = routes::create_router(state, config.max_upload_bytes);

    let addr = format!("{}:{}", config.host, config.port).parse::<SocketAddr>()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
