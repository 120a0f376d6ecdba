//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use snomed_core::{ErrorKind, ExtractionError, Locale};

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Extraction {
        error: ExtractionError,
        locale: Locale,
    },
    /// Body missing, not JSON, or not matching the request shape
    InvalidBody(String),
}

impl AppError {
    /// Wrap an extraction failure, rendering its message in `locale`
    pub fn extraction(error: ExtractionError, locale: Locale) -> Self {
        Self::Extraction { error, locale }
    }
}

/// Status and public code for each extraction failure kind
fn extraction_status(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Transport => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        ErrorKind::EnvelopeShape => (StatusCode::BAD_GATEWAY, "UPSTREAM_SHAPE_ERROR"),
        ErrorKind::PayloadDecode => (StatusCode::BAD_GATEWAY, "UPSTREAM_PAYLOAD_ERROR"),
        ErrorKind::Config => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
        ErrorKind::Unknown => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Extraction { error, locale } => {
                let (status, code) = extraction_status(error.kind());
                (status, ApiError::new(code, error.localized(locale)))
            }
            AppError::InvalidBody(detail) => (
                StatusCode::BAD_REQUEST,
                ApiError::bad_request("Invalid request body").with_details(detail),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}
