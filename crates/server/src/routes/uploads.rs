use axum::{
    Extension,
    extract::{Multipart, State},
    response::Json as ResponseJson,
};
use db::models::{session::WorkshopSession, submission::Submission};
use serde::Serialize;
use services::services::upload::StoredUpload;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload: StoredUpload,
    pub submission: Submission,
}

/// Stores the participant's photo and records its public URL on the
/// submission. Expects a multipart body with an `image` field.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<UploadResponse>>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let stored = state
            .uploads()
            .store_original(&file_name, mime_type.as_deref(), &bytes)
            .await?;

        let current = Submission::find_by_uuid(&state.db().conn, session.submission_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
        let submission = Submission::set_original_image(
            &state.db().conn,
            session.submission_id,
            &stored.public_url,
            current.profile_version,
        )
        .await?;

        return Ok(ResponseJson(ApiResponse::success(UploadResponse {
            upload: stored,
            submission,
        })));
    }

    Err(ApiError::BadRequest(
        "Geen foto gevonden in de upload.".to_string(),
    ))
}
