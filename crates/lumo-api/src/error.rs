use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use lumo_core::CoreError;
use lumo_model::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("capability not supported: {0}")]
    CapabilityUnsupported(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::CapabilityUnsupported(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Model(ModelError::UnsupportedContentType { .. }) => {
                ApiError::UnsupportedMedia(err.to_string())
            }
            CoreError::Model(_) => ApiError::InvalidRequest(err.to_string()),
            CoreError::CapabilityUnsupported { .. } => {
                ApiError::CapabilityUnsupported(err.to_string())
            }
            CoreError::Runtime(_) | CoreError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::from(CoreError::Model(err))
    }
}
