use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Caller-visible error taxonomy for every gateway operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("processor unreachable: {message}")]
    TransportFailure { message: String, timed_out: bool },

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The processor refused the gateway's own credentials. Classified as an
    /// auth failure but answered as a bad gateway, since the caller's
    /// credentials are not at fault.
    #[error("processor rejected gateway credentials (status {status}, code {code:?}): {message}")]
    ProcessorAuthFailure {
        status: u16,
        code: String,
        message: String,
    },

    #[error("not found ({code}): {message}")]
    NotFound { code: String, message: String },

    #[error("processor error (status {status}, code {code:?}): {message}")]
    Processor {
        status: u16,
        code: String,
        message: String,
        retryable: bool,
    },

    #[error("malformed webhook: {0}")]
    MalformedWebhook(String),

    #[error("webhook {event_id} dispatch failed: {message}")]
    DispatchFailed { event_id: String, message: String },

    #[error("idempotency store unavailable: {0}")]
    IdempotencyStore(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification used for branching without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    TransportFailure,
    AuthFailure,
    NotFound,
    ProcessorError,
    MalformedWebhook,
    DispatchFailed,
    IdempotencyStore,
    Config,
}

impl GatewayError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation { .. } => ErrorKind::Validation,
            GatewayError::TransportFailure { .. } => ErrorKind::TransportFailure,
            GatewayError::AuthFailure(_) | GatewayError::ProcessorAuthFailure { .. } => {
                ErrorKind::AuthFailure
            }
            GatewayError::NotFound { .. } => ErrorKind::NotFound,
            GatewayError::Processor { .. } => ErrorKind::ProcessorError,
            GatewayError::MalformedWebhook(_) => ErrorKind::MalformedWebhook,
            GatewayError::DispatchFailed { .. } => ErrorKind::DispatchFailed,
            GatewayError::IdempotencyStore(_) => ErrorKind::IdempotencyStore,
            GatewayError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the caller (or its transport collaborator) may retry.
    /// The gateway itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::TransportFailure { .. } => true,
            GatewayError::IdempotencyStore(_) => true,
            GatewayError::Processor { retryable, .. } => *retryable,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation { .. } | GatewayError::MalformedWebhook(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Processor { .. } | GatewayError::ProcessorAuthFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::TransportFailure { .. } | GatewayError::IdempotencyStore(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::DispatchFailed { .. } | GatewayError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        let (message, field, code) = match err {
            GatewayError::Validation { field, message } => {
                (message.clone(), Some(field.clone()), None)
            }
            GatewayError::NotFound { code, message } => {
                (message.clone(), None, Some(code.clone()))
            }
            // Processor code and message go out verbatim.
            GatewayError::Processor { code, message, .. }
            | GatewayError::ProcessorAuthFailure { code, message, .. } => {
                (message.clone(), None, Some(code.clone()))
            }
            other => (other.to_string(), None, None),
        };

        ErrorResponse {
            error: err.kind(),
            message,
            field,
            code,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}
