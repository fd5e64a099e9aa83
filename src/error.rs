use std::io;

use reqwest::StatusCode;

/// Broad classification of a [`DeployError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MalformedEvent,
    Transport,
}

/// Custom error type for dynamic_deploy operations
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to read '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed '{event}' event: {message}")]
    MalformedEvent { event: String, message: String },

    #[error("Request to deploy endpoint failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Deploy endpoint responded with {status}: {body}")]
    BadStatus { status: StatusCode, body: String },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::ConfigError(_) | DeployError::IoError { .. } => ErrorKind::Configuration,
            DeployError::MalformedEvent { .. } => ErrorKind::MalformedEvent,
            DeployError::RequestFailed(_) | DeployError::BadStatus { .. } => ErrorKind::Transport,
        }
    }
}

/// Helper type for Results that use DeployError
pub type Result<T> = std::result::Result<T, DeployError>;
