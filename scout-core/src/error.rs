//! Error types for scout-core

use std::time::Duration;

use thiserror::Error;

/// Main error type for the scout-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A value typed by the user could not be understood
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The agent could not be reached (DNS, refused connection, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// The agent answered with a non-success status
    #[error("agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The client-side deadline expired before the stream ended
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// Reading the response body failed after the stream had started
    #[error("stream error: {0}")]
    Stream(String),

    /// The agent answered without a response body
    #[error("agent response has no body")]
    EmptyBody,

    /// The search was cancelled or superseded by a newer one
    #[error("search cancelled")]
    Cancelled,
}

impl Error {
    /// Message suitable for showing to the person who ran the search.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(_) => {
                "Network connection issue. Please check your internet connection and try again."
                    .to_string()
            }
            Error::Status { status, .. } => format!("Search failed: HTTP error! status: {status}"),
            Error::Timeout(_) => {
                "Search timed out. Please try a more specific query or try again later."
                    .to_string()
            }
            Error::Stream(_) | Error::EmptyBody | Error::Json(_) => {
                "Error processing search results. Please try again with a different query."
                    .to_string()
            }
            Error::Cancelled => "Search was cancelled. Please try again.".to_string(),
            Error::Io(_) | Error::Config(_) | Error::InvalidInput(_) => {
                format!("Search failed: {self}")
            }
        }
    }

    /// Map a reqwest failure raised while sending the request.
    pub(crate) fn from_request(error: reqwest::Error, deadline: Duration) -> Self {
        if error.is_connect() {
            Error::Transport(error.to_string())
        } else if error.is_timeout() {
            Error::Timeout(deadline)
        } else {
            Error::Transport(error.to_string())
        }
    }
}

/// Result type alias for scout-core
pub type Result<T> = std::result::Result<T, Error>;
