//! Error handling module for the hackathon backend.
//!
//! Every workflow failure ends up as one [`AppError`] whose message is shown to
//! the user verbatim. Errors map to HTTP status codes and a response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::validation::Invalid;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_NAME: &str = "DUPLICATE_NAME";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_TEAM: &str = "INVALID_TEAM";
    pub const DATA_INTEGRITY: &str = "DATA_INTEGRITY";
    pub const ALREADY_SUBMITTED: &str = "ALREADY_SUBMITTED";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const UPLOAD_ERROR: &str = "UPLOAD_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Fallback when a collaborator gave no message.
pub const GENERIC_MESSAGE: &str = "An error occurred. Please try again.";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// A field failed a rule; the user can fix it on the current step
    Validation(Invalid),
    /// Team name already registered
    DuplicateName(String),
    /// Team, member or submission not found
    NotFound(String),
    /// Team ID given on the submission page does not exist
    InvalidTeam(String),
    /// Stored team has no leader row
    LeaderMissing(String),
    /// Team already has a submission
    AlreadySubmitted(String),
    /// Record store failure
    Store(String),
    /// Object storage failure
    Upload(String),
    /// Malformed request
    BadRequest(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateName(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTeam(_) => StatusCode::NOT_FOUND,
            AppError::LeaderMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AlreadySubmitted(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::DuplicateName(_) => codes::DUPLICATE_NAME,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::InvalidTeam(_) => codes::INVALID_TEAM,
            AppError::LeaderMissing(_) => codes::DATA_INTEGRITY,
            AppError::AlreadySubmitted(_) => codes::ALREADY_SUBMITTED,
            AppError::Store(_) => codes::STORE_ERROR,
            AppError::Upload(_) => codes::UPLOAD_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        let message = match self {
            AppError::Validation(invalid) => &invalid.reason,
            AppError::DuplicateName(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidTeam(msg)
            | AppError::LeaderMissing(msg)
            | AppError::AlreadySubmitted(msg)
            | AppError::Store(msg)
            | AppError::Upload(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg) => msg,
        };
        if message.trim().is_empty() {
            GENERIC_MESSAGE.to_string()
        } else {
            message.clone()
        }
    }

    /// Wrap a collaborator error with the stage that failed, e.g.
    /// `Team creation failed: ...`.
    pub fn store(stage: &str, err: impl std::fmt::Display) -> Self {
        AppError::Store(stage_message(stage, err))
    }

    pub fn upload(stage: &str, err: impl std::fmt::Display) -> Self {
        AppError::Upload(stage_message(stage, err))
    }
}

fn stage_message(stage: &str, err: impl std::fmt::Display) -> String {
    let detail = err.to_string();
    if detail.trim().is_empty() {
        format!("{}: {}", stage, GENERIC_MESSAGE)
    } else {
        format!("{}: {}", stage, detail)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<Invalid> for AppError {
    fn from(invalid: Invalid) -> Self {
        AppError::Validation(invalid)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation(invalid) => Some(serde_json::json!({ "field": invalid.field })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self.message());
        } else {
            tracing::debug!(code = self.error_code(), "{}", self.message());
        }
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}
