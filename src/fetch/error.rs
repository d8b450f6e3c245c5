use std::time::Duration;

use thiserror::Error;

/// Why one collection could not be refreshed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("endpoint answered with status {status}")]
    Status { status: u16 },
    #[error("request was not authorized")]
    Unauthorized,
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Unauthorized => "unauthorized",
            FetchError::Decode(_) => "decode",
            FetchError::Timeout(_) => "timeout",
        }
    }
}
