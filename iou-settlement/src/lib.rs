//! IOU Settlement Client
//!
//! Turns the IOU ledger into a credit network: reconstructs debt history,
//! finds settlement cycles and cancels circular debt at write time.
//!
//! # Architecture
//!
//! Every request works on a freshly fetched view of the ledger:
//!
//! 1. **Scanning**: Walk the block history from head to origin, decoding `add_IOU` calls
//! 2. **Graph**: Fold events into participants and potential creditors
//! 3. **Search**: Breadth-first search for a chain of debts closing a cycle
//! 4. **Netting**: Cancel the smaller of the new amount and the path minimum
//!
//! Balances always come live from the ledger; the client keeps no graph
//! state between calls.
//!
//! # Example
//!
//! ```no_run
//! use iou_settlement::{Config, IouClient};
//! use iou_ledger::{Identity, LocalLedger};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> iou_settlement::Result<()> {
//!     let ledger = Arc::new(LocalLedger::spawn(Identity::with_last_byte(0xcc)));
//!     let client = IouClient::new(ledger.clone(), ledger.contract(), &Config::default());
//!
//!     let alice = Identity::with_last_byte(1);
//!     let bob = Identity::with_last_byte(2);
//!     client.add_iou(&alice, &bob, 10).await?;
//!
//!     println!("Alice owes {} in total", client.get_total_owed(&alice).await?);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod client;
pub mod config;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod netting;
pub mod oracle;
pub mod query;
pub mod scanner;
pub mod types;

// Re-exports
pub use client::IouClient;
pub use config::Config;
pub use error::{Error, Result};
pub use oracle::{BalanceOracle, OracleSession};
pub use scanner::{HistoryScanner, ScanOptions};
pub use types::*;
