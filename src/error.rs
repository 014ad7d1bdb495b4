use crate::scoring::{BracketError, ScoringError};
use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let (status, message) = match self {
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        HttpResponse::build(status).json(&serde_json::json!({ "error": message }))
    }
}

impl From<ScoringError> for AppError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::Finalized => AppError::Conflict(e.to_string()),
            ScoringError::InconsistentAttempt(_) => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<BracketError> for AppError {
    fn from(e: BracketError) -> Self {
        match e {
            BracketError::MatchNotFound { .. } => AppError::NotFound(e.to_string()),
            BracketError::LaterStageScored(_) => AppError::Conflict(e.to_string()),
            BracketError::TopCountOutOfRange(_)
            | BracketError::NotEnoughClimbers(_)
            | BracketError::ClimberNotInMatch { .. }
            | BracketError::ByeMatch { .. } => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}
