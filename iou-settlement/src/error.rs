//! Error types for the settlement client

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] iou_ledger::Error),

    /// History walk stopped before reaching the origin
    #[error("History scan incomplete after {blocks_visited} blocks: {reason}")]
    ScanIncomplete {
        /// Blocks fetched before the scan stopped
        blocks_visited: u64,
        /// Why the scan stopped
        reason: String,
    },

    /// Parent links do not form a chain ending at the origin
    #[error("Corrupt history: {0}")]
    CorruptHistory(String),

    /// Settlement path cannot be netted
    #[error("Invalid settlement path: {0}")]
    InvalidPath(String),

    /// Request refused before reaching the ledger
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure comes from reaching the ledger rather than its verdict
    pub fn is_connectivity(&self) -> bool {
        match self {
            Error::Ledger(e) => matches!(
                e,
                iou_ledger::Error::Transport(_)
                    | iou_ledger::Error::Rpc { .. }
                    | iou_ledger::Error::BlockNotFound(_)
                    | iou_ledger::Error::ReceiptTimeout(_)
            ),
            Error::ScanIncomplete { .. } => true,
            _ => false,
        }
    }

    /// Whether the ledger refused the write
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Ledger(e) if e.is_rejection())
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
