use axum::{
    Extension, Json,
    extract::State,
    response::Json as ResponseJson,
};
use db::models::{
    submission::Submission,
    workshop::{CreateWorkshop, Workshop},
};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn list_workshops(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Workshop>>>, ApiError> {
    let workshops = Workshop::find_all(&state.db().conn).await?;
    Ok(ResponseJson(ApiResponse::success(workshops)))
}

pub async fn create_workshop(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkshop>,
) -> Result<ResponseJson<ApiResponse<Workshop>>, ApiError> {
    if payload.title.trim().is_empty() || payload.access_code.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and access code are required".to_string(),
        ));
    }
    let workshop = Workshop::create(&state.db().conn, &payload).await?;
    tracing::info!(title = %workshop.title, "Workshop created");
    Ok(ResponseJson(ApiResponse::success(workshop)))
}

pub async fn get_workshop(
    Extension(workshop): Extension<Workshop>,
) -> Result<ResponseJson<ApiResponse<Workshop>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(workshop)))
}

pub async fn set_workshop_active(
    State(state): State<AppState>,
    Extension(workshop): Extension<Workshop>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<ResponseJson<ApiResponse<Workshop>>, ApiError> {
    let workshop = Workshop::set_active(&state.db().conn, workshop.id, payload.active).await?;
    Ok(ResponseJson(ApiResponse::success(workshop)))
}

pub async fn delete_workshop(
    State(state): State<AppState>,
    Extension(workshop): Extension<Workshop>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Workshop::delete(&state.db().conn, workshop.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Review view: every submission made under one workshop, newest first.
pub async fn list_workshop_submissions(
    State(state): State<AppState>,
    Extension(workshop): Extension<Workshop>,
) -> Result<ResponseJson<ApiResponse<Vec<Submission>>>, ApiError> {
    let submissions = Submission::find_by_workshop(&state.db().conn, workshop.id).await?;
    Ok(ResponseJson(ApiResponse::success(submissions)))
}
