//! Agent backend errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base URL '{0}'")]
    BaseUrl(String),
}

impl ApiError {
    /// Text shown to the user when a session cannot be started
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(msg) => msg.clone(),
            Self::Network(e) if e.is_connect() => "Could not reach the backend".to_string(),
            other => other.to_string(),
        }
    }
}
