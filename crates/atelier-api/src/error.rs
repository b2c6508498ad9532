use atelier_engagement::EngagementError;
use atelier_media::MediaError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Engagement(#[from] EngagementError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Image exceeds the 5 MB limit")]
    PayloadTooLarge,

    #[error("Image upload failed")]
    MediaUnavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Engagement(e) => match e {
                EngagementError::Unauthenticated(_) | EngagementError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                EngagementError::Forbidden(_) => StatusCode::FORBIDDEN,
                EngagementError::NotFound(_) => StatusCode::NOT_FOUND,
                EngagementError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MediaUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Parses a post id path segment. Malformed ids get the JSON error envelope
/// instead of axum's plain-text path rejection.
pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid post id".into()))
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Engagement(e.into())
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotAnImage => ApiError::BadRequest(e.to_string()),
            MediaError::TooLarge => ApiError::PayloadTooLarge,
            other => {
                warn!("Upload error: {}", other);
                ApiError::MediaUnavailable
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // store details stay in the log
        let message = match &self {
            ApiError::Engagement(EngagementError::StoreUnavailable(detail)) => {
                error!("Store error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
