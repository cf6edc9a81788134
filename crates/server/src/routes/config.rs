use axum::{Json, extract::State, response::Json as ResponseJson};
use services::services::config::{Config, save_config_to_file};
use utils::assets::config_path;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn get_config(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Config>>, ApiError> {
    let config = state.config().read().await.clone();
    Ok(ResponseJson(ApiResponse::success(config)))
}

/// Replaces the config and persists it. The watch rhythm and session TTL
/// apply to new requests immediately; webhook and upload settings are
/// captured by their services at startup and need a restart.
pub async fn update_config(
    State(state): State<AppState>,
    Json(payload): Json<Config>,
) -> Result<ResponseJson<ApiResponse<Config>>, ApiError> {
    save_config_to_file(&payload, &config_path()).await?;
    let mut config = state.config().write().await;
    *config = payload;
    tracing::info!("Configuration updated");
    Ok(ResponseJson(ApiResponse::success(config.clone())))
}
