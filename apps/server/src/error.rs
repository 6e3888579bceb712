// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing GPS metadata: {0}")]
    MissingGeoreference(String),

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingGeoreference(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_GEOREFERENCE")
            }
            ApiError::InvalidPhoto(_) => (StatusCode::BAD_REQUEST, "INVALID_PHOTO"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<facade_lite_core::Error> for ApiError {
    fn from(err: facade_lite_core::Error) -> Self {
        use facade_lite_core::Error;
        match err {
            Error::NotFound(what) => ApiError::NotFound(what),
            Error::Storage(msg) => ApiError::Storage(msg),
            other @ (Error::InvalidInput(_) | Error::Parse { .. } | Error::Json(_)) => {
                ApiError::BadRequest(other.to_string())
            }
        }
    }
}

impl From<facade_lite_geometry::Error> for ApiError {
    fn from(err: facade_lite_geometry::Error) -> Self {
        use facade_lite_geometry::Error;
        match err {
            Error::MissingGeoreference(image) => ApiError::MissingGeoreference(image),
            Error::InvalidPhoto(msg) => ApiError::InvalidPhoto(msg),
            Error::CoreError(inner) => inner.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}
