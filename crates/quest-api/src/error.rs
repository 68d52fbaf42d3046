use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use quest_core::QuestError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error(transparent)]
    Core(#[from] QuestError),

    #[error("worker task failed: {0}")]
    Join(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Core(e) => match e {
                QuestError::Validation(_) | QuestError::MissingTarget => StatusCode::BAD_REQUEST,
                QuestError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                QuestError::NotFound(_) => StatusCode::NOT_FOUND,
                QuestError::InvalidState { .. } | QuestError::DuplicateReview => {
                    StatusCode::CONFLICT
                }
                QuestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Core(e) => e.kind(),
            Self::Join(_) => "internal",
        }
    }
}

// Extractor rejections are malformed input, reported like any other
// validation failure.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Core(QuestError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Core(QuestError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Core(QuestError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {:#}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message, "code": self.code() }))).into_response()
    }
}
