use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Main error type for the service
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    #[diagnostic(code(meetings::invalid_argument))]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(meetings::not_found))]
    NotFound(String),

    #[error("Method {method} not allowed")]
    #[diagnostic(code(meetings::method_not_allowed))]
    MethodNotAllowed {
        method: String,
        allowed: &'static str,
    },

    #[error("Environment error: {0}")]
    #[diagnostic(code(meetings::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(meetings::config))]
    Config(String),

    #[error("Document store error: {0}")]
    #[diagnostic(code(meetings::store))]
    Store(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(meetings::google_calendar))]
    GoogleCalendar(String),

    #[error(transparent)]
    #[diagnostic(code(meetings::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(meetings::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(meetings::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::GoogleCalendar(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type ServiceResult<T> = Result<T, Error>;

impl Error {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable code placed in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            _ => "INTERNAL",
        }
    }

    /// Message exposed to clients. Internal failures stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidArgument(msg) | Error::NotFound(msg) => msg.clone(),
            Error::MethodNotAllowed { .. } => self.to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorEnvelope {
            success: false,
            error: ErrorDetail {
                code: self.code(),
                message: self.public_message(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Error::MethodNotAllowed { allowed, .. } = &self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allowed));
        }
        response
    }
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create document store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create validation errors
pub fn invalid_argument(message: &str) -> Error {
    Error::InvalidArgument(message.to_string())
}

/// Helper to create not found errors
pub fn not_found(message: &str) -> Error {
    Error::NotFound(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
