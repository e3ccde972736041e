//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Input required and not supplied: {name}")]
    MissingInput { name: String },

    #[error("ttl is set but release name '{release}' does not contain '{marker}'")]
    TtlWithoutPreviewRelease {
        release: String,
        marker: &'static str,
    },

    #[error("Invalid service account credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to serialize values: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
