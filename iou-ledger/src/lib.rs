//! IOU Ledger
//!
//! Client-side view of the authoritative IOU ledger: a smart contract that
//! records per-pair debt balances, plus the append-only block history its
//! writes live in.
//!
//! # Architecture
//!
//! - **Ledger trait**: head, blocks, balance lookup and IOU write
//! - **Contract codec**: ABI encoding of `add_IOU` / `lookup` calls
//! - **JSON-RPC adapter**: a node reached over HTTP
//! - **In-process ledger**: single-writer actor executing the contract rules
//!
//! # Invariants
//!
//! - Identity equality is byte equality, never text comparison
//! - History is a backward-linked chain ending at [`ORIGIN`]
//! - Rejected writes leave balances untouched and are never retried

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod abi;
pub mod actor;
pub mod config;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod local;
pub mod metrics;
pub mod rpc;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use local::LocalLedger;
pub use rpc::RpcLedger;
pub use types::{Block, BlockHash, BlockId, Identity, IouRequest, Receipt, Transaction, ORIGIN};
