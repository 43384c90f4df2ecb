//! Analysis client error types

use contracts::ContractError;
use thiserror::Error;

/// Analysis client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout)
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("analysis api error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Progress socket could not be opened
    #[error("websocket connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// Progress socket broke mid-stream
    #[error("websocket protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Status code of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ClientError> for ContractError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, body } => ContractError::ApiStatus { status, body },
            ClientError::Connection { .. } | ClientError::Protocol(_) => {
                ContractError::progress("websocket", err.to_string())
            }
            other => ContractError::ApiRequest {
                message: other.to_string(),
            },
        }
    }
}

/// Analysis client Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;
