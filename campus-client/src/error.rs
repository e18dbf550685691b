use thiserror::Error;

/// Errors surfaced by the client SDK.
///
/// Failed operations are never retried automatically; the caller decides
/// whether to surface, retry or discard.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server rejected the request; carries the server's message field
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport-level failure reaching the server
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Durable session storage failed
    #[error("session storage: {0}")]
    Storage(#[from] std::io::Error),

    /// The stored session document could not be decoded
    #[error("corrupt session storage: {0}")]
    CorruptStorage(#[from] serde_json::Error),

    /// The session token could not be decoded
    #[error("malformed session token")]
    MalformedToken,

    /// The operation requires an authenticated session
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Status code of the server rejection, if this is an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Type alias for client operation results
pub type Result<T> = std::result::Result<T, ClientError>;
