//! The error taxonomy for request handling.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl
//! converts failures into the uniform `{errno: 1, errmsg}` envelope at the
//! outermost boundary so no raw fault escapes as plain text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or empty.
    #[error("Missing required fields")]
    Validation(String),

    /// The referenced post does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Admin credential missing or mismatched.
    #[error("Permission denied")]
    Permission,

    /// The underlying store reported a failure.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Permission => StatusCode::FORBIDDEN,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn errmsg(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Permission => "Permission denied".to_string(),
            Self::Storage(source) => format!("Server error: {source}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(source) = &self {
            tracing::error!(error = ?source, "Request failed with storage error");
        }

        let body = Json(json!({ "errno": 1, "errmsg": self.errmsg() }));
        (self.status(), body).into_response()
    }
}
