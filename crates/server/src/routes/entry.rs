use axum::{Json, extract::State, response::Json as ResponseJson};
use chrono::{DateTime, Utc};
use db::models::{session::WorkshopSession, workshop::Workshop};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub access_code: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub session_id: Uuid,
    pub submission_id: Uuid,
    pub workshop_id: Uuid,
    pub workshop_title: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchanges an access code for a fresh session. An unknown or deactivated
/// code gets the same rejection, so codes cannot be probed.
pub async fn enter(
    State(state): State<AppState>,
    Json(payload): Json<EntryRequest>,
) -> Result<ResponseJson<ApiResponse<EntryResponse>>, ApiError> {
    let code = payload.access_code.trim();
    if code.is_empty() {
        return Err(ApiError::BadRequest("Vul een toegangscode in.".to_string()));
    }

    let workshop = Workshop::find_by_access_code(&state.db().conn, code)
        .await?
        .filter(|workshop| workshop.active)
        .ok_or_else(|| {
            ApiError::BadRequest("Ongeldige toegangscode. Probeer het opnieuw.".to_string())
        })?;

    let ttl_secs = state.config().read().await.session.ttl_secs;
    let (session, submission) =
        WorkshopSession::create(&state.db().conn, &workshop, ttl_secs).await?;

    tracing::info!(
        workshop = %workshop.title,
        session_id = %session.id,
        "Participant entered workshop"
    );

    Ok(ResponseJson(ApiResponse::success(EntryResponse {
        session_id: session.id,
        submission_id: submission.id,
        workshop_id: workshop.id,
        workshop_title: workshop.title,
        expires_at: session.expires_at,
    })))
}
