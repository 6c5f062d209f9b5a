//! In-process ledger
//!
//! Executes the IOU contract rules inside the current process and keeps a
//! real backward-linked block history, one block per accepted transaction.
//! Used by tests, demos and anywhere a node is not available.
//!
//! # Example
//!
//! ```no_run
//! use iou_ledger::{Identity, IouRequest, Ledger, LocalLedger};
//!
//! #[tokio::main]
//! async fn main() -> iou_ledger::Result<()> {
//!     let ledger = LocalLedger::spawn(Identity::with_last_byte(0xcc));
//!     let alice = Identity::with_last_byte(1);
//!     let bob = Identity::with_last_byte(2);
//!
//!     ledger.record_iou(IouRequest::plain(alice, bob, 10)).await?;
//!     assert_eq!(ledger.lookup_balance(&alice, &bob).await?, 10);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::abi::encode_add_iou;
use crate::actor::{spawn_ledger_actor, LedgerHandle};
use crate::ledger::Ledger;
use crate::types::{Block, BlockId, Identity, IouRequest, Receipt};
use crate::Result;
use alloy_primitives::Bytes;
use async_trait::async_trait;

/// Default mailbox capacity of the ledger actor
const MAILBOX_CAPACITY: usize = 1000;

/// In-process ledger handle (cheap to clone)
#[derive(Debug, Clone)]
pub struct LocalLedger {
    /// Actor handle for async operations
    handle: LedgerHandle,

    /// Address of the contract
    contract: Identity,
}

impl LocalLedger {
    /// Start a ledger whose contract lives at `contract`
    pub fn spawn(contract: Identity) -> Self {
        Self {
            handle: spawn_ledger_actor(contract, MAILBOX_CAPACITY),
            contract,
        }
    }

    /// Address of the contract
    pub fn contract(&self) -> Identity {
        self.contract
    }

    /// Submit an arbitrary transaction
    ///
    /// Calls to the contract are executed and rejected if invalid; anything
    /// else (including contract creation when `to` is `None`) is mined with
    /// no effect on balances.
    pub async fn submit_transaction(
        &self,
        from: Identity,
        to: Option<Identity>,
        input: Bytes,
    ) -> Result<Receipt> {
        self.handle.submit_transaction(from, to, input).await
    }

    /// Shutdown ledger
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn head(&self) -> Result<BlockId> {
        self.handle.head().await
    }

    async fn block(&self, id: BlockId) -> Result<Block> {
        self.handle.get_block(id).await
    }

    async fn lookup_balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32> {
        self.handle.lookup(*debtor, *creditor).await
    }

    async fn record_iou(&self, request: IouRequest) -> Result<Receipt> {
        let input = encode_add_iou(&request);
        let receipt = self
            .handle
            .submit_transaction(request.debtor, Some(self.contract), input)
            .await?;

        tracing::info!(
            debtor = %request.debtor,
            creditor = %request.creditor,
            amount = request.amount,
            net_amount = request.net_amount,
            block = receipt.block_number,
            "IOU recorded"
        );

        Ok(receipt)
    }
}
