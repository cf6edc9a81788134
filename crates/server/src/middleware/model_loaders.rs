use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{session::WorkshopSession, workshop::Workshop};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Resolves `{session_id}` into a live session. Expired or unknown ids
/// surface as 401 so the frontend sends the participant back to the start.
pub async fn load_session_middleware(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = WorkshopSession::find_valid(&state.db().conn, session_id).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

pub async fn load_workshop_middleware(
    State(state): State<AppState>,
    Path(workshop_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let workshop = Workshop::find_by_uuid(&state.db().conn, workshop_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Workshop {workshop_id} not found");
            ApiError::NotFound("Workshop not found".to_string())
        })?;
    request.extensions_mut().insert(workshop);
    Ok(next.run(request).await)
}
