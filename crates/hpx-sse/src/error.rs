//! Error handling for the SSE client and writer.

use std::time::Duration;

use thiserror::Error;

/// The main result type used throughout this crate.
pub type SseResult<T> = Result<T, SseError>;

/// Errors produced while connecting to, reading from, or writing an SSE stream.
///
/// Malformed event-stream input is never an error: the parser is lenient by
/// definition. Everything here is either a transport problem, a configuration
/// problem, or cancellation.
#[derive(Error, Debug)]
pub enum SseError {
    /// HTTP client errors (wraps `reqwest::Error`).
    #[cfg(feature = "http-client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("Unexpected SSE response status: {status}")]
    InvalidStatus { status: http::StatusCode },

    /// The server answered with a content type other than `text/event-stream`.
    #[error("Unexpected SSE content type: {content_type}")]
    InvalidContentType { content_type: String },

    /// I/O errors from the underlying stream or sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be established.
    #[error("Connection error: {message}")]
    Connect { message: String },

    /// The stream failed while it was being read.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The operation observed its cancellation signal.
    #[error("Operation cancelled")]
    Cancelled,
}

impl SseError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create an invalid status error.
    pub fn invalid_status(status: http::StatusCode) -> Self {
        Self::InvalidStatus { status }
    }

    /// Create an invalid content type error.
    pub fn invalid_content_type(content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            content_type: content_type.into(),
        }
    }

    /// Returns `true` if this error is the cancellation signal rather than a
    /// stream failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
