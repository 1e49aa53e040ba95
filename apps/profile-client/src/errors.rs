use thiserror::Error;

/// Errors raised by the profile client.
///
/// A non-2xx status is NOT an error: it comes back as a normal
/// [`Response`](crate::response::Response) for the caller to inspect.
/// Only failures that prevent a response from being received (or a payload
/// from being built) end up here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, timeout, or the body could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid payload field '{field}': {reason}")]
    InvalidPayload { field: String, reason: String },

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response body is not JSON (status {status})")]
    NotJson { status: u16 },

    #[error("Failed to read attachment '{path}': {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The task carrying a concurrent submission panicked or was cancelled.
    #[error("Submission task did not complete: {0}")]
    TaskFailed(String),
}

impl ClientError {
    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        ClientError::InvalidPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that happened on the wire, before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// True when the transport failure was the request timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_timeout())
    }
}
