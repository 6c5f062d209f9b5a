//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Connectivity failure talking to the ledger node
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message reported by the node
        message: String,
    },

    /// Block not found
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// The ledger refused a write (revert, failed validation)
    #[error("Ledger rejected write: {0}")]
    Rejected(String),

    /// Write submitted but no receipt arrived in time
    #[error("No receipt for transaction {0} before timeout")]
    ReceiptTimeout(String),

    /// Malformed payload returned by the ledger
    #[error("Decode error: {0}")]
    Decode(String),

    /// Text that is not a valid account identity
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same read could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Whether the ledger itself refused a write
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
