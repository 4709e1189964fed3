// Domain errors
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InsightError {
    #[error("sample rejected: {0}")]
    InvalidSample(String),

    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("color palette must not be empty")]
    EmptyPalette,

    #[error("insight session is not active")]
    SessionInactive,

    #[error("insight session lost its accumulator and cannot restart")]
    SessionUnavailable,
}

/// Failures reported by a device or a telemetry sink.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("sink rejected telemetry with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ConnectivityError {
    fn from(err: reqwest::Error) -> Self {
        ConnectivityError::Transport(err.to_string())
    }
}
