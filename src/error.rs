use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the client library.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend answered with a status outside 2xx. Carries the body text.
    #[error("request failed with status {status}: {body}")]
    Request { status: StatusCode, body: String },

    /// Connection, TLS or protocol failure before a status was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend sent a payload that does not match the endpoint schema.
    #[error("malformed response from {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A JSON body was expected but the response was 204 or empty.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// Client-side validation rejected the input before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("corrupt storage file: {0}")]
    StorageFormat(#[source] serde_json::Error),
}

impl ClientError {
    /// Status code of a rejected request, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            ClientError::Network(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
