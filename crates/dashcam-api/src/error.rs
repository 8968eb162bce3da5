//! API and session error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashcam_media::MediaError;
use dashcam_models::ClientId;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidConfig(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures that end (or, for skipped frames, interrupt) a streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Malformed inbound image payload
    #[error("Invalid frame: {0}")]
    Decode(String),

    /// Output video cannot be opened or written
    #[error("Output error: {0}")]
    Sink(String),

    /// Structurally invalid inbound message
    #[error("Invalid message: {0}")]
    Protocol(String),

    /// Peer went away
    #[error("Client disconnected")]
    Disconnected,
}

impl SessionError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Whether the client should be told about this failure.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, SessionError::Disconnected)
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Decode(_) => "decode",
            SessionError::Sink(_) => "sink",
            SessionError::Protocol(_) => "protocol",
            SessionError::Disconnected => "disconnected",
        }
    }
}

impl From<MediaError> for SessionError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Decode(msg) => SessionError::Decode(msg),
            other => SessionError::Sink(other.to_string()),
        }
    }
}

/// Session registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A session is already active for client {0}")]
    DuplicateSession(ClientId),
}
