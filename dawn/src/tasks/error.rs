//! Task service error types

use thiserror::Error;

use crate::retry::{HttpStatus, is_retryable_status};

/// Errors that can occur while talking to the task service
#[derive(Debug, Error)]
pub enum TasksError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TasksError {
    /// HTTP status attached to this error, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            TasksError::Api { status, .. } => Some(*status),
            TasksError::Network(e) => e.status().map(|s| s.as_u16()),
            TasksError::Auth(_) => None,
            TasksError::InvalidResponse(_) => None,
            TasksError::Json(_) => None,
        }
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        self.status() == Some(429)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status().is_some_and(is_retryable_status)
    }
}

impl HttpStatus for TasksError {
    fn http_status(&self) -> Option<u16> {
        self.status()
    }
}
