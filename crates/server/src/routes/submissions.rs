use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use db::TransactionTrait;
use db::models::{
    session::WorkshopSession,
    submission::{FeedbackPatch, ProfileAnswers, Submission},
    webhook_outbox::WebhookOutboxEntry,
};
use serde::{Deserialize, Serialize};
use services::services::{
    dispatch::{GenerationPayload, WebhookDispatcher},
    watch::{WatchOutcome, watch_until},
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

const STILL_WAITING: &str = "Het duurt langer dan verwacht. Probeer het later opnieuw.";

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(flatten)]
    pub answers: ProfileAnswers,
    pub version: i32,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(flatten)]
    pub patch: FeedbackPatch,
    pub version: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegenerateRequest {
    pub reuse_image: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionsReady {
    pub question1: String,
    pub question2: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedImage {
    pub image_url: String,
    pub summary: Option<String>,
    pub latin_name: Option<String>,
    pub ai_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub session: WorkshopSession,
    pub submission: Submission,
}

/// Current record plus the delivery history of its outbox entries, so an
/// abandoned webhook is visible instead of silently stuck.
#[derive(Debug, Serialize)]
pub struct SubmissionStatus {
    #[serde(flatten)]
    pub submission: Submission,
    pub webhook_deliveries: Vec<WebhookOutboxEntry>,
}

/// Writes the organism answers and queues the webhook toward the generation
/// workflow in the same transaction. The answers only leave the server once
/// both land together.
pub async fn put_questions(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
    Json(payload): Json<QuestionsRequest>,
) -> Result<ResponseJson<ApiResponse<Submission>>, ApiError> {
    let txn = state.db().conn.begin().await?;
    let submission = Submission::update_profile(
        &txn,
        session.submission_id,
        &payload.answers,
        payload.version,
    )
    .await?;
    let webhook_payload = GenerationPayload::from_submission(&submission)?;
    WebhookDispatcher::enqueue(&txn, &webhook_payload).await?;
    txn.commit().await?;

    // kick a delivery attempt now instead of waiting for the next sweep
    let dispatcher = state.dispatcher().clone();
    tokio::spawn(async move {
        if let Err(err) = dispatcher.flush_pending().await {
            tracing::warn!("Immediate webhook flush failed: {}", err);
        }
    });

    Ok(ResponseJson(ApiResponse::success(submission)))
}

/// Long-polls until the generation workflow has written both reflection
/// questions. A run that exhausts the deadline answers 202, not an error.
pub async fn await_questions(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
) -> Result<Response, ApiError> {
    let watch_config = state.config().read().await.watch;
    let conn = state.db().conn.clone();
    let submission_id = session.submission_id;

    let outcome = watch_until(watch_config, state.shutdown_token(), move || {
        let conn = conn.clone();
        async move {
            let submission = Submission::find_by_uuid(&conn, submission_id).await?;
            Ok::<_, ApiError>(submission.and_then(|s| s.questions_ready()))
        }
    })
    .await?;

    Ok(match outcome {
        WatchOutcome::Ready((question1, question2)) => ResponseJson(ApiResponse::success(
            QuestionsReady {
                question1,
                question2,
            },
        ))
        .into_response(),
        WatchOutcome::TimedOut { checks } | WatchOutcome::Cancelled { checks } => {
            tracing::info!(
                submission_id = %submission_id,
                checks,
                "Questions not ready within deadline"
            );
            // a slow workflow is not a failure, the client just polls again
            (
                StatusCode::ACCEPTED,
                ResponseJson(ApiResponse::success_with_message((), STILL_WAITING)),
            )
                .into_response()
        }
    })
}

pub async fn put_feedback(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<ResponseJson<ApiResponse<Submission>>, ApiError> {
    let submission = Submission::update_feedback(
        &state.db().conn,
        session.submission_id,
        &payload.patch,
        payload.version,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(submission)))
}

/// Long-polls until the generated image URL lands on the submission.
pub async fn await_image(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
) -> Result<Response, ApiError> {
    let watch_config = state.config().read().await.watch;
    let conn = state.db().conn.clone();
    let submission_id = session.submission_id;

    let outcome = watch_until(watch_config, state.shutdown_token(), move || {
        let conn = conn.clone();
        async move {
            let submission = Submission::find_by_uuid(&conn, submission_id).await?;
            Ok::<_, ApiError>(submission.and_then(|s| {
                s.image_ready().map(|image_url| GeneratedImage {
                    image_url,
                    summary: s.summary.clone(),
                    latin_name: s.latin_name.clone(),
                    ai_description: s.ai_description.clone(),
                })
            }))
        }
    })
    .await?;

    Ok(match outcome {
        WatchOutcome::Ready(image) => ResponseJson(ApiResponse::success(image)).into_response(),
        WatchOutcome::TimedOut { checks } | WatchOutcome::Cancelled { checks } => {
            tracing::info!(
                submission_id = %submission_id,
                checks,
                "Image not ready within deadline"
            );
            (
                StatusCode::ACCEPTED,
                ResponseJson(ApiResponse::success_with_message((), STILL_WAITING)),
            )
                .into_response()
        }
    })
}

pub async fn get_submission(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
) -> Result<ResponseJson<ApiResponse<SubmissionStatus>>, ApiError> {
    let submission = Submission::find_by_uuid(&state.db().conn, session.submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    let webhook_deliveries =
        WebhookOutboxEntry::find_by_submission(&state.db().conn, session.submission_id).await?;
    Ok(ResponseJson(ApiResponse::success(SubmissionStatus {
        submission,
        webhook_deliveries,
    })))
}

/// Opens a fresh submission under the same session. With `reuse_image` the
/// newest upload of this participant carries over; without it they
/// re-upload.
pub async fn regenerate(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
    Json(payload): Json<RegenerateRequest>,
) -> Result<ResponseJson<ApiResponse<RegenerateResponse>>, ApiError> {
    let txn = state.db().conn.begin().await?;

    let carried_image = if payload.reuse_image {
        Submission::find_latest_for_user(&txn, session.user_id)
            .await?
            .into_iter()
            .find_map(|s| s.original_image_url)
    } else {
        None
    };

    let submission =
        Submission::create(&txn, session.user_id, session.workshop_id, carried_image).await?;
    let session = WorkshopSession::rebind_submission(&txn, session.id, submission.id).await?;
    txn.commit().await?;

    tracing::info!(
        session_id = %session.id,
        submission_id = %submission.id,
        "Session rebound for regeneration"
    );
    Ok(ResponseJson(ApiResponse::success(RegenerateResponse {
        session,
        submission,
    })))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Extension(session): Extension<WorkshopSession>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    WorkshopSession::delete(&state.db().conn, session.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}
