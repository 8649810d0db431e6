use thiserror::Error;
use serde::{Serialize, Deserialize};

// Import Axum types for HTTP response conversion
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending input (`id`, `email`, `hours`, ...)
    pub path: String,
    pub message: String,
}

/// The custom error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from the sqlx library.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Malformed request input, with field-level details.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// Missing, malformed or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Login failed. Deliberately the same for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Unique email constraint violated.
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("No user found: {0}")]
    NoUserFound(String),

    #[error("No shift found: {0}")]
    NoShiftFound(String),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

/// Wire shape of every error response: `{"error": {"type", "message", "errors"?}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

const INTERNAL_MESSAGE: &str = "Internal Server Error";

impl Error {
    /// Shorthand for a validation failure on one field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Error::Validation {
            message: format!("request/{} {}", field, message),
            errors: vec![FieldError {
                path: field.to_string(),
                message,
            }],
        }
    }

    /// The `type` reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "request_validation",
            Error::Unauthorized(_) => "unauthorized",
            Error::InvalidCredentials => "invalid_credentials",
            Error::AccountAlreadyExists(_) => "account_already_exists",
            Error::NoUserFound(_) => "no_user_found",
            Error::NoShiftFound(_) => "no_shift_found",
            Error::Sqlx(_) | Error::Internal(_) | Error::Config(_) => {
                "internal_server_error"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidCredentials => StatusCode::NOT_FOUND,
            Error::AccountAlreadyExists(_) => StatusCode::CONFLICT,
            Error::NoUserFound(_) => StatusCode::NOT_FOUND,
            Error::NoShiftFound(_) => StatusCode::NOT_FOUND,
            Error::Sqlx(_) | Error::Internal(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the client-facing body. Internal details never leave the process.
    pub fn to_response_body(&self) -> ErrorResponse {
        let (message, errors) = match self {
            Error::Validation { message, errors } => (message.clone(), Some(errors.clone())),
            Error::Unauthorized(msg) => (msg.clone(), None),
            Error::InvalidCredentials => ("Invalid Login/Password".to_string(), None),
            Error::AccountAlreadyExists(email) => (format!("{} already exists", email), None),
            Error::NoUserFound(msg) | Error::NoShiftFound(msg) => (msg.clone(), None),
            Error::Sqlx(_) | Error::Internal(_) | Error::Config(_) => {
                (INTERNAL_MESSAGE.to_string(), None)
            }
        };

        ErrorResponse {
            error: ErrorDetail {
                kind: self.kind().to_string(),
                message,
                errors,
            },
        }
    }
}

/// Convert custom Error to HTTP response
///
/// Expected domain errors keep their message. Everything else is logged here
/// and reported as a generic 500.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(self.to_response_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_details() {
        let err = Error::Internal("connection refused to 10.0.0.3".to_string());
        let body = err.to_response_body();
        assert_eq!(body.error.kind, "internal_server_error");
        assert_eq!(body.error.message, "Internal Server Error");
        assert!(body.error.errors.is_none());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_references_field() {
        let err = Error::validation("id", "must match pattern \"^[a-f0-9]{24}$\"");
        let body = err.to_response_body();
        assert_eq!(body.error.kind, "request_validation");
        let errors = body.error.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "id");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_status_codes() {
        assert_eq!(Error::InvalidCredentials.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::AccountAlreadyExists("a@b.co".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Unauthorized("Authentication Failed".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::AccountAlreadyExists("a@b.co".into()).to_response_body().error.message,
            "a@b.co already exists"
        );
    }

    #[test]
    fn test_errors_field_omitted_when_absent() {
        let json = serde_json::to_value(Error::InvalidCredentials.to_response_body()).unwrap();
        assert_eq!(json["error"]["type"], "invalid_credentials");
        assert!(json["error"].get("errors").is_none());
    }
}
