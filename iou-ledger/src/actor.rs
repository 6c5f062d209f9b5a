//! Actor-based concurrency for the in-process ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the chain and the contract state, so writes are totally ordered
//! - Every accepted transaction is mined into its own block
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        IouClient / tests / concurrent queries         │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  chain: genesis ◄── #1 ◄── #2 ◄── ... ◄── head       │
//! │  state: ContractState (debt[debtor][creditor])       │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::abi::{self, ADD_IOU};
use crate::contract::ContractState;
use crate::crypto::{hash_block, hash_transaction};
use crate::types::{Block, BlockHash, BlockId, Identity, Receipt, Transaction, ORIGIN};
use crate::{Error, Result};
use alloy_primitives::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Execute and mine a transaction
    SubmitTransaction {
        from: Identity,
        to: Option<Identity>,
        input: Bytes,
        response: oneshot::Sender<Result<Receipt>>,
    },

    /// Get the head block reference
    GetHead {
        response: oneshot::Sender<Result<BlockId>>,
    },

    /// Get block by height or hash
    GetBlock {
        id: BlockId,
        response: oneshot::Sender<Result<Block>>,
    },

    /// Read a balance
    Lookup {
        debtor: Identity,
        creditor: Identity,
        response: oneshot::Sender<Result<u32>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the chain and contract state
#[derive(Debug)]
pub struct LedgerActor {
    /// Address the contract lives at
    contract: Identity,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Blocks indexed by height
    chain: Vec<Block>,

    /// Height lookup by hash
    by_hash: HashMap<BlockHash, usize>,

    /// Contract balances
    state: ContractState,

    /// Per-sender transaction counters
    nonces: HashMap<Identity, u64>,
}

impl LedgerActor {
    /// Create new actor with a genesis block
    pub fn new(contract: Identity, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        let timestamp = now_seconds();
        let genesis = Block {
            hash: hash_block(&ORIGIN, 0, timestamp, &[]),
            parent_hash: ORIGIN,
            number: 0,
            timestamp,
            transactions: vec![],
        };

        let mut by_hash = HashMap::new();
        by_hash.insert(genesis.hash, 0);

        Self {
            contract,
            mailbox,
            chain: vec![genesis],
            by_hash,
            state: ContractState::new(),
            nonces: HashMap::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }

        tracing::debug!(height = self.head().number, "Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::SubmitTransaction {
                from,
                to,
                input,
                response,
            } => {
                let result = self.submit(from, to, input);
                let _ = response.send(result);
            }

            LedgerMessage::GetHead { response } => {
                let _ = response.send(Ok(BlockId::Hash(self.head().hash)));
            }

            LedgerMessage::GetBlock { id, response } => {
                let _ = response.send(self.get_block(id));
            }

            LedgerMessage::Lookup {
                debtor,
                creditor,
                response,
            } => {
                let _ = response.send(Ok(self.state.lookup(&debtor, &creditor)));
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn head(&self) -> &Block {
        // Genesis is created in `new` and blocks are never removed
        &self.chain[self.chain.len() - 1]
    }

    fn get_block(&self, id: BlockId) -> Result<Block> {
        let index = match id {
            BlockId::Number(n) => usize::try_from(n).ok(),
            BlockId::Hash(hash) => self.by_hash.get(&hash).copied(),
        };

        index
            .and_then(|i| self.chain.get(i))
            .cloned()
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))
    }

    /// Execute a transaction; mine it only if it was accepted
    fn submit(&mut self, from: Identity, to: Option<Identity>, input: Bytes) -> Result<Receipt> {
        if to == Some(self.contract) {
            self.execute_contract_call(from, &input)?;
        }

        let nonce = self.nonces.entry(from).or_insert(0);
        let transaction = Transaction {
            hash: hash_transaction(&from, to.as_ref(), &input, *nonce),
            from,
            to,
            input,
        };
        *nonce += 1;

        Ok(self.mine(transaction))
    }

    fn execute_contract_call(&mut self, from: Identity, input: &[u8]) -> Result<()> {
        let call = abi::decode_call(input)
            .ok_or_else(|| Error::Rejected("Input is not a contract call".to_string()))?;

        if call.method != ADD_IOU {
            // View functions have no effect when sent as transactions
            return Ok(());
        }

        let malformed = || Error::Rejected("Malformed add_IOU arguments".to_string());
        let creditor = call
            .params
            .first()
            .and_then(|v| v.as_identity())
            .ok_or_else(malformed)?;
        let amount = call.params.get(1).and_then(|v| v.as_uint()).ok_or_else(malformed)?;
        let path = call
            .params
            .get(2)
            .and_then(|v| v.as_identities())
            .ok_or_else(malformed)?;
        let min_on_cycle = call.params.get(3).and_then(|v| v.as_uint()).ok_or_else(malformed)?;

        // Decoded from uint32 fields
        let amount = u32::try_from(amount).map_err(|_| malformed())?;
        let min_on_cycle = u32::try_from(min_on_cycle).map_err(|_| malformed())?;

        self.state.add_iou(from, creditor, amount, path, min_on_cycle)
    }

    fn mine(&mut self, transaction: Transaction) -> Receipt {
        let (parent_hash, number, timestamp) = {
            let parent = self.head();
            (parent.hash, parent.number + 1, now_seconds().max(parent.timestamp))
        };
        let transaction_hash = transaction.hash;

        let block = Block {
            hash: hash_block(&parent_hash, number, timestamp, &[transaction_hash]),
            parent_hash,
            number,
            timestamp,
            transactions: vec![transaction],
        };

        tracing::debug!(number, hash = %block.hash, "Mined block");

        let receipt = Receipt {
            transaction_hash,
            block_hash: block.hash,
            block_number: number,
        };

        self.by_hash.insert(block.hash, self.chain.len());
        self.chain.push(block);

        receipt
    }
}

fn now_seconds() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Execute and mine a transaction
    pub async fn submit_transaction(
        &self,
        from: Identity,
        to: Option<Identity>,
        input: Bytes,
    ) -> Result<Receipt> {
        self.request(|response| LedgerMessage::SubmitTransaction {
            from,
            to,
            input,
            response,
        })
        .await
    }

    /// Get head block reference
    pub async fn head(&self) -> Result<BlockId> {
        self.request(|response| LedgerMessage::GetHead { response }).await
    }

    /// Get block by height or hash
    pub async fn get_block(&self, id: BlockId) -> Result<Block> {
        self.request(|response| LedgerMessage::GetBlock { id, response })
            .await
    }

    /// Read a balance
    pub async fn lookup(&self, debtor: Identity, creditor: Identity) -> Result<u32> {
        self.request(|response| LedgerMessage::Lookup {
            debtor,
            creditor,
            response,
        })
        .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(contract: Identity, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(contract, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode_add_iou;
    use crate::types::IouRequest;

    fn id(byte: u8) -> Identity {
        Identity::with_last_byte(byte)
    }

    const CONTRACT: u8 = 0xcc;

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_genesis_block() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);

        let head = handle.head().await.unwrap();
        let genesis = handle.get_block(head).await.unwrap();
        assert_eq!(genesis.number, 0);
        assert_eq!(genesis.parent_hash, ORIGIN);
        assert!(genesis.transactions.is_empty());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_accepted_call_is_mined() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);
        let genesis = handle.get_block(BlockId::Number(0)).await.unwrap();

        let input = encode_add_iou(&IouRequest::plain(id(1), id(2), 10));
        let receipt = handle
            .submit_transaction(id(1), Some(id(CONTRACT)), input.clone())
            .await
            .unwrap();
        assert_eq!(receipt.block_number, 1);

        let block = handle.get_block(BlockId::Hash(receipt.block_hash)).await.unwrap();
        assert_eq!(block.parent_hash, genesis.hash);
        assert!(block.timestamp >= genesis.timestamp);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].input, input);
        assert_eq!(block.transactions[0].from, id(1));

        assert_eq!(handle.lookup(id(1), id(2)).await.unwrap(), 10);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_call_is_not_mined() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);

        let input = encode_add_iou(&IouRequest::plain(id(1), id(1), 10));
        let result = handle
            .submit_transaction(id(1), Some(id(CONTRACT)), input)
            .await;
        assert!(matches!(result, Err(Error::Rejected(_))));

        let result = handle
            .submit_transaction(id(1), Some(id(CONTRACT)), Bytes::from_static(b"junk"))
            .await;
        assert!(matches!(result, Err(Error::Rejected(_))));

        let head = handle.get_block(handle.head().await.unwrap()).await.unwrap();
        assert_eq!(head.number, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unrelated_traffic_is_mined_without_effect() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);

        let input = encode_add_iou(&IouRequest::plain(id(1), id(2), 10));
        // Same call data to another address, then a contract creation
        handle.submit_transaction(id(1), Some(id(0xdd)), input.clone()).await.unwrap();
        let receipt = handle.submit_transaction(id(1), None, input).await.unwrap();

        assert_eq!(receipt.block_number, 2);
        assert_eq!(handle.lookup(id(1), id(2)).await.unwrap(), 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_block() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);

        let result = handle.get_block(BlockId::Number(5)).await;
        assert!(matches!(result, Err(Error::BlockNotFound(_))));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_mailbox() {
        let handle = spawn_ledger_actor(id(CONTRACT), 16);
        handle.shutdown().await.unwrap();
        tokio::task::yield_now().await;

        // Give the actor time to exit
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let result = handle.head().await;
        assert!(matches!(result, Err(Error::Concurrency(_))));
    }
}
