use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    ServerError,
    Timeout,
    Network,
    InvalidResponse,
    Unknown,
}

impl ApiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::Forbidden => "FORBIDDEN",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::BadRequest => "BAD_REQUEST",
            ApiErrorCode::ServerError => "SERVER_ERROR",
            ApiErrorCode::Timeout => "HTTP_TIMEOUT",
            ApiErrorCode::Network => "NETWORK_ERROR",
            ApiErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ApiErrorCode::Unknown => "UNKNOWN_API_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure classes a page reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FetchFailed,
    ValidationFailed,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Api {
        code: ApiErrorCode,
        message: String,
        status: Option<u16>,
        correlation_id: Option<String>,
    },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Record not found")]
    NotFound,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn api(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self::api_with_details(code, message, None, None)
    }

    pub fn api_with_details(
        code: ApiErrorCode,
        message: impl Into<String>,
        status: Option<u16>,
        correlation_id: Option<&str>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match (&correlation, status) {
            (Some(id), Some(status)) => {
                warn!(target: "app::api::error", code = %code, status, correlation_id = %id, %message);
            }
            (Some(id), None) => {
                warn!(target: "app::api::error", code = %code, correlation_id = %id, %message);
            }
            (None, Some(status)) => {
                warn!(target: "app::api::error", code = %code, status, %message);
            }
            (None, None) => {
                warn!(target: "app::api::error", code = %code, %message);
            }
        }

        AppError::Api {
            code,
            message,
            status,
            correlation_id: correlation,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::api(ApiErrorCode::Unauthorized, message)
    }

    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            AppError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn api_status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => *status,
            _ => None,
        }
    }

    pub fn api_correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Api { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Api { .. } => ErrorCategory::FetchFailed,
            AppError::Validation { .. } => ErrorCategory::ValidationFailed,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::QueryReturnedNoRows => AppError::not_found(),
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
