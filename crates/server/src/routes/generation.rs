use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Json as ResponseJson,
};
use db::models::submission::{GenerationPatch, Submission};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Callback body from the generation workflow. `image_id` is the submission
/// id, named per the workflow's wire contract.
#[derive(Debug, Deserialize)]
pub struct GenerationCallback {
    #[serde(rename = "image_id")]
    pub submission_id: Uuid,
    #[serde(flatten)]
    pub patch: GenerationPatch,
}

/// The workflow reports results in stages over this endpoint: first the
/// reflection questions, later the image URL. Each call patches only the
/// fields it carries.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GenerationCallback>,
) -> Result<ResponseJson<ApiResponse<Submission>>, ApiError> {
    let expected = state.config().read().await.webhook.callback_token.clone();
    if let Some(expected) = expected {
        let provided = headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            tracing::warn!(
                submission_id = %payload.submission_id,
                "Generation callback with bad token rejected"
            );
            return Err(ApiError::Unauthorized);
        }
    }

    let current = Submission::find_by_uuid(&state.db().conn, payload.submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let submission = Submission::update_generation(
        &state.db().conn,
        payload.submission_id,
        &payload.patch,
        current.generation_version,
    )
    .await?;

    tracing::info!(
        submission_id = %submission.id,
        questions = submission.questions_ready().is_some(),
        image = submission.image_ready().is_some(),
        "Generation callback applied"
    );
    Ok(ResponseJson(ApiResponse::success(submission)))
}
