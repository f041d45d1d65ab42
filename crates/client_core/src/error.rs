use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} responded with status {status}{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("could not decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
    #[error("could not encode {endpoint} request: {message}")]
    Encode {
        endpoint: &'static str,
        message: String,
    },
}

impl BackendError {
    pub(crate) fn transport(endpoint: &'static str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect to server".to_string()
        } else {
            err.to_string()
        };
        Self::Transport { endpoint, message }
    }

    /// Best-effort text for surfacing the failure to the user.
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Transport { message, .. }
            | BackendError::Decode { message, .. }
            | BackendError::Encode { message, .. } => Some(message.as_str()),
            BackendError::Status { detail, .. } => detail.as_deref(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("failed to prepare download directory '{}': {source}", dir.display())]
    Directory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no free file name for '{0}'")]
    Exhausted(String),
}
