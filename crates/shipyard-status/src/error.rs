//! Error types for status reporting

use thiserror::Error;

/// Status API errors
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for StatusError {
    fn from(e: reqwest::Error) -> Self {
        StatusError::NetworkError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;
