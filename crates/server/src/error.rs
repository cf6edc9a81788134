use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    models::{
        admin::AdminError, session::SessionError, submission::SubmissionError,
        webhook_outbox::WebhookOutboxError, workshop::WorkshopError,
    },
    sea_orm::DbErr,
};
use services::services::{
    config::ConfigError, dispatch::DispatchError, storage::StorageError, upload::UploadError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workshop(#[from] WorkshopError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Outbox(#[from] WebhookOutboxError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Workshop(err) => match err {
                WorkshopError::NotFound => (StatusCode::NOT_FOUND, "WorkshopError"),
                WorkshopError::DuplicateAccessCode => (StatusCode::CONFLICT, "WorkshopError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "WorkshopError"),
            },
            ApiError::Session(err) => match err {
                SessionError::NotFound | SessionError::Expired => {
                    (StatusCode::UNAUTHORIZED, "SessionError")
                }
                SessionError::WorkshopNotFound => (StatusCode::NOT_FOUND, "SessionError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "SessionError"),
            },
            ApiError::Submission(err) => match err {
                SubmissionError::NotFound | SubmissionError::WorkshopNotFound => {
                    (StatusCode::NOT_FOUND, "SubmissionError")
                }
                SubmissionError::ProfileAlreadySubmitted
                | SubmissionError::ImageAlreadyStored
                | SubmissionError::VersionConflict { .. } => {
                    (StatusCode::CONFLICT, "SubmissionError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "SubmissionError"),
            },
            ApiError::Admin(err) => match err {
                AdminError::NotFound => (StatusCode::NOT_FOUND, "AdminError"),
                AdminError::DuplicateEmail => (StatusCode::CONFLICT, "AdminError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "AdminError"),
            },
            ApiError::Outbox(err) => match err {
                WebhookOutboxError::NotFound => (StatusCode::NOT_FOUND, "OutboxError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "OutboxError"),
            },
            ApiError::Dispatch(err) => match err {
                DispatchError::IncompleteSubmission => (StatusCode::BAD_REQUEST, "DispatchError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DispatchError"),
            },
            ApiError::Upload(err) => match err {
                UploadError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "UploadError"),
                UploadError::UnsupportedType(_) | UploadError::HeicNotSupported => {
                    (StatusCode::BAD_REQUEST, "UploadError")
                }
                UploadError::Conversion(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UploadError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "UploadError"),
            },
            ApiError::Storage(err) => match err {
                StorageError::InvalidKey(_) => (StatusCode::BAD_REQUEST, "StorageError"),
                StorageError::AlreadyExists(_) => (StatusCode::CONFLICT, "StorageError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "StorageError"),
            },
            ApiError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MultipartError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        // Participant-facing failures carry a message the frontend shows
        // verbatim, in the workshop's language.
        let error_message = match &self {
            ApiError::Session(SessionError::NotFound | SessionError::Expired) => {
                "Je sessie is verlopen. Start opnieuw.".to_string()
            }
            ApiError::Submission(SubmissionError::VersionConflict { .. }) => {
                "Je inzending is ondertussen gewijzigd. Herlaad de pagina en probeer het opnieuw."
                    .to_string()
            }
            ApiError::Upload(UploadError::TooLarge { size, max }) => format!(
                "De foto is te groot ({:.1} MB). Maximaal {:.1} MB.",
                *size as f64 / 1_048_576.0,
                *max as f64 / 1_048_576.0
            ),
            ApiError::Upload(UploadError::UnsupportedType(_)) => {
                "Dit bestandstype wordt niet ondersteund. Upload een foto (JPG, PNG of WebP)."
                    .to_string()
            }
            ApiError::Upload(UploadError::HeicNotSupported) => {
                "HEIC-foto's worden niet ondersteund. Zet je camera op 'Meest compatibel' of \
                 upload de foto als JPG of PNG."
                    .to_string()
            }
            ApiError::Upload(UploadError::Conversion(_)) => {
                "Het verwerken van je foto is mislukt. Probeer een andere foto.".to_string()
            }
            ApiError::Multipart(_) => {
                "Het uploaden is mislukt. Controleer het bestand en probeer het opnieuw.".to_string()
            }
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        (status_code, Json(ApiResponse::<()>::error(&error_message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn session_errors_map_to_unauthorized() {
        assert_eq!(
            status_of(ApiError::Session(SessionError::Expired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Session(SessionError::NotFound)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn stale_writes_map_to_conflict() {
        assert_eq!(
            status_of(ApiError::Submission(SubmissionError::VersionConflict {
                part: "profile"
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Submission(SubmissionError::ProfileAlreadySubmitted)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn upload_errors_map_by_kind() {
        assert_eq!(
            status_of(ApiError::Upload(UploadError::TooLarge {
                size: 20_000_000,
                max: 10_485_760
            })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(ApiError::Upload(UploadError::UnsupportedType(
                "text/plain".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Upload(UploadError::HeicNotSupported)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unknown_workshop_maps_to_not_found() {
        assert_eq!(
            status_of(ApiError::Workshop(WorkshopError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
