use std::time::Duration;

use db::{DBService, models::session::WorkshopSession, sea_orm::DbErr};
use server::{AppState, http};
use services::services::{config::load_config_from_file, storage::StorageError};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::assets::{asset_dir, config_path, storage_dir};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let config = load_config_from_file(&config_path()).await;
    let host = config.server.host.clone();
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let db = DBService::new().await?;
    let state = AppState::new(db, config, storage_dir())?;

    let shutdown = state.shutdown_token().clone();
    state.dispatcher().clone().spawn_worker(shutdown.clone());

    let sweep_conn = state.db().conn.clone();
    let sweep_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sweep_shutdown.cancelled() => break,
                _ = tokio::time::sleep(SESSION_SWEEP_INTERVAL) => {
                    match db::retry_on_db_busy(|| WorkshopSession::sweep_expired(&sweep_conn)).await {
                        Ok(0) => {}
                        Ok(removed) => tracing::info!(removed, "Swept expired sessions"),
                        Err(err) => tracing::warn!("Session sweep failed: {}", err),
                    }
                }
            }
        }
    });

    let app_router = http::router(state);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app_router)
        .with_graceful_shutdown(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::select! {
                _ = ctrl_c => {}
                _ = shutdown.cancelled() => {}
            }
            shutdown.cancel();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
