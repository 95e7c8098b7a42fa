use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::inference::InferenceError;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Everything that ends a caption request early.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The body could not be read, e.g. it exceeds the size limit.
    #[error("Invalid request: {message}")]
    Body { status: StatusCode, message: String },
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(ValidationError::UnsupportedMediaType) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Validation(
                ValidationError::MalformedBody
                | ValidationError::MissingImage
                | ValidationError::MissingPrompt,
            ) => StatusCode::BAD_REQUEST,
            ApiError::Inference(InferenceError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Inference(InferenceError::Unreachable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // reqwest and axum sit on different `http` versions
            ApiError::Inference(InferenceError::Upstream { status, .. }) => {
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Inference(InferenceError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
