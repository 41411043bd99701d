//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "BUSY")]
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

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new("BUSY", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Busy(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Busy(msg) => (StatusCode::CONFLICT, ApiError::busy(msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<biorex_core::BiorexError> for AppError {
    fn from(err: biorex_core::BiorexError) -> Self {
        use biorex_core::BiorexError;

        match err {
            BiorexError::Validation(msg) => AppError::BadRequest(msg),
            BiorexError::Busy(msg) => AppError::Busy(msg),
            BiorexError::NotFound(msg) => AppError::NotFound(msg),
            BiorexError::Extraction(msg) => AppError::Internal(format!("Extraction failed: {msg}")),
            BiorexError::InvalidState(msg) => AppError::Internal(format!("Invalid state: {msg}")),
            BiorexError::Llm(msg) => AppError::Internal(format!("LLM error: {msg}")),
            BiorexError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            BiorexError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}
