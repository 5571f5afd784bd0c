//! Error types for the gateway

use samtich_core::SurveyError;
use teloxide::RequestError;
use thiserror::Error;

/// Gateway error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Http(String),

    #[error("Telegram API error: {0}")]
    TelegramApi(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Survey error: {0}")]
    Survey(#[from] SurveyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}

impl From<RequestError> for GatewayError {
    fn from(e: RequestError) -> Self {
        match &e {
            RequestError::Network(_) | RequestError::Io(_) => GatewayError::Http(e.to_string()),
            _ => GatewayError::TelegramApi(e.to_string()),
        }
    }
}

/// The survey engine only sees transport failures
impl From<GatewayError> for SurveyError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Survey(inner) => inner,
            other => SurveyError::Transport(other.to_string()),
        }
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::ApiError;

    #[test]
    fn test_api_error_reaches_engine_as_transport() {
        let err = GatewayError::from(RequestError::Api(ApiError::MessageNotModified));
        assert!(matches!(err, GatewayError::TelegramApi(_)));
        assert!(matches!(SurveyError::from(err), SurveyError::Transport(_)));
    }

    #[test]
    fn test_survey_error_passes_through() {
        let err = GatewayError::Survey(SurveyError::Storage("disk full".into()));
        assert!(matches!(SurveyError::from(err), SurveyError::Storage(_)));
    }
}
