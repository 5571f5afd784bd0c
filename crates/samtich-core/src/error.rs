//! Error types for the survey core

use thiserror::Error;

/// Survey error type
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session is incomplete: missing {0}")]
    IncompleteSession(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SurveyError {
    fn from(e: serde_json::Error) -> Self {
        SurveyError::Serialization(e.to_string())
    }
}

/// Result type for survey operations
pub type Result<T> = std::result::Result<T, SurveyError>;
