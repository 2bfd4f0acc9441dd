// ABOUTME: Error types for the present-plus server
// ABOUTME: Provides structured error handling for parsing, rendering and serving

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("No template registered for {0:?}")]
    MissingTemplate(PathBuf),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Invalid request path: {0}")]
    InvalidRequestPath(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

pub type Result<T> = std::result::Result<T, PresentError>;
