//! The ledger as seen by a client
//!
//! Everything the credit network needs from the authoritative ledger goes
//! through [`Ledger`]: the head of the block history, individual blocks by
//! height or hash, the balance point lookup and the IOU write. Two
//! implementations ship with this crate:
//!
//! - [`RpcLedger`](crate::rpc::RpcLedger): a node reached over JSON-RPC
//! - [`LocalLedger`](crate::local::LocalLedger): an in-process ledger that
//!   executes the contract rules itself
//!
//! # Example
//!
//! ```no_run
//! use iou_ledger::{Identity, Ledger, LocalLedger};
//!
//! #[tokio::main]
//! async fn main() -> iou_ledger::Result<()> {
//!     let contract = Identity::with_last_byte(0xcc);
//!     let ledger = LocalLedger::spawn(contract);
//!
//!     let head = ledger.head().await?;
//!     let block = ledger.block(head).await?;
//!     println!("head is block {} with {} transactions", block.number, block.transactions.len());
//!
//!     Ok(())
//! }
//! ```

use crate::types::{Block, BlockId, Identity, IouRequest, Receipt};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Authoritative ledger holding per-pair debt balances
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current head of the block history
    async fn head(&self) -> Result<BlockId>;

    /// Fetch one block with its full transactions
    async fn block(&self, id: BlockId) -> Result<Block>;

    /// Amount `debtor` currently owes `creditor`
    async fn lookup_balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32>;

    /// Submit an IOU on behalf of `request.debtor`
    ///
    /// Rejections surface as [`Error::Rejected`](crate::Error::Rejected) and
    /// are never retried by the implementation.
    async fn record_iou(&self, request: IouRequest) -> Result<Receipt>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn head(&self) -> Result<BlockId> {
        (**self).head().await
    }

    async fn block(&self, id: BlockId) -> Result<Block> {
        (**self).block(id).await
    }

    async fn lookup_balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32> {
        (**self).lookup_balance(debtor, creditor).await
    }

    async fn record_iou(&self, request: IouRequest) -> Result<Receipt> {
        (**self).record_iou(request).await
    }
}
