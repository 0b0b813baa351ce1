//! Error types for the barfeed system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the barfeed system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (also used for invalid call arguments).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request or connection failure. Never retried internally.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status returned by the venue.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Malformed or unexpected payload.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Interval tag with no entry in the interval table.
    #[error("Unknown interval: {0}")]
    UnknownInterval(String),

    /// Live feed terminated by a failure.
    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// Input data violates an expected invariant.
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Create an API error from a status code and response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Error::Conversion(msg.into())
    }

    /// Create a stream-closed error.
    pub fn stream_closed(msg: impl Into<String>) -> Self {
        Error::StreamClosed(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(429, "too many requests");
        assert_eq!(err.to_string(), "API error (status 429): too many requests");
    }

    #[test]
    fn test_json_from() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
