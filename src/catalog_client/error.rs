use thiserror::Error;

/// Failure of a single page fetch. Always returned as a value, never raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Request could not be built (empty query, bad limit, unparsable base URL)
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),

    /// Network-level failure or a non-success HTTP status
    #[error("catalog transport failure: {message}")]
    TransportFailure {
        message: String,
        /// HTTP status code if the server answered
        status: Option<u16>,
    },

    /// Response body did not match the expected volumes shape
    #[error("failed to decode catalog response: {0}")]
    DecodeFailure(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return FetchError::InvalidRequest(err.to_string());
        }
        if err.is_decode() {
            return FetchError::DecodeFailure(err.to_string());
        }
        FetchError::TransportFailure {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::DecodeFailure(err.to_string())
    }
}
