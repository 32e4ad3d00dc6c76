// File: core/error.rs
// Error type shared by the dispatcher, the verb helpers and the probes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),

    // serde_json::Error, both for decoding responses and encoding bodies
    #[error("Failed to parse JSON response or payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A structured body was given without a JSON content type.
    #[error("Cannot send body: {0}")]
    InvalidBody(String),

    #[error("Failed to decode response body as {encoding}: {message}")]
    Decode {
        encoding: &'static str,
        message: String,
    },

    #[error("Failed to resolve host {0}")]
    Resolve(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// HTTP status of the response, when the failure came from a non-success status.
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
