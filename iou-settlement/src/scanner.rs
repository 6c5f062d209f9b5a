//! History scanner
//!
//! Walks the ledger backward from the head block to the origin, decoding
//! every call to the contract and keeping the ones that match a method.
//!
//! ```text
//! head ──parent──► #n-1 ──parent──► ... ──parent──► #0 ──parent──► ORIGIN
//!   │                │                                │
//!   └── decode txs ──┴────────────── decode txs ──────┘
//! ```
//!
//! Each block is fetched exactly once. Any fetch failure fails the whole
//! scan; a truncated event set is never returned.

use crate::metrics::{SCAN_BLOCKS_TOTAL, SCAN_DURATION, SCAN_EVENTS_TOTAL};
use crate::types::IouEvent;
use crate::{Error, Result};
use iou_ledger::abi::decode_call;
use iou_ledger::{Block, BlockId, Identity, Ledger};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Limits applied to one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Overall deadline for the walk
    pub timeout: Option<Duration>,

    /// Maximum number of blocks to fetch
    pub max_blocks: Option<u64>,
}

/// Backward walker over the ledger history
#[derive(Debug)]
pub struct HistoryScanner<L: ?Sized> {
    ledger: Arc<L>,
    options: ScanOptions,
    cancel: CancellationToken,
}

impl<L: Ledger + ?Sized> HistoryScanner<L> {
    /// Create scanner over a shared ledger connection
    pub fn new(ledger: Arc<L>, options: ScanOptions) -> Self {
        Self {
            ledger,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop scans when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Collect every call to `method` on `contract`
    ///
    /// Output order is unspecified.
    pub async fn scan(&self, contract: &Identity, method: &str) -> Result<Vec<IouEvent>> {
        let started = Instant::now();
        let deadline = self
            .options
            .timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        let mut blocks_visited = 0u64;
        let mut seen = HashSet::new();
        let mut events = Vec::new();

        let head = self
            .guarded(self.ledger.head(), deadline, blocks_visited)
            .await?;
        let mut next = Some(head);

        while let Some(id) = next {
            if let Some(max) = self.options.max_blocks {
                if blocks_visited >= max {
                    return Err(Error::ScanIncomplete {
                        blocks_visited,
                        reason: format!("block limit of {} reached", max),
                    });
                }
            }

            let block = self
                .guarded(self.ledger.block(id), deadline, blocks_visited)
                .await?;

            if !seen.insert(block.hash) {
                return Err(Error::CorruptHistory(format!(
                    "block {} reached twice while walking parent links",
                    block.hash
                )));
            }
            blocks_visited += 1;
            SCAN_BLOCKS_TOTAL.inc();

            let kept = events_in_block(&block, contract, method);
            SCAN_EVENTS_TOTAL.inc_by(kept.len() as u64);
            events.extend(kept);

            next = block
                .has_parent()
                .then_some(BlockId::Hash(block.parent_hash));
        }

        SCAN_DURATION.observe(started.elapsed().as_secs_f64());
        debug!(
            head = %head,
            blocks = blocks_visited,
            events = events.len(),
            "History scan complete"
        );

        Ok(events)
    }

    /// Await a ledger call unless the scan is cancelled or out of time
    async fn guarded<T>(
        &self,
        call: impl Future<Output = iou_ledger::Result<T>>,
        deadline: Option<tokio::time::Instant>,
        blocks_visited: u64,
    ) -> Result<T> {
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(Error::ScanIncomplete {
                blocks_visited,
                reason: "cancelled".to_string(),
            }),
            _ = expired => Err(Error::ScanIncomplete {
                blocks_visited,
                reason: "timed out".to_string(),
            }),
            result = call => Ok(result?),
        }
    }
}

/// Events for `method` on `contract` in one block
///
/// Contract creations, transactions to other addresses, undecodable input
/// and calls to other methods are skipped.
pub fn events_in_block(block: &Block, contract: &Identity, method: &str) -> Vec<IouEvent> {
    block
        .transactions
        .iter()
        .filter(|tx| tx.to.as_ref() == Some(contract))
        .filter_map(|tx| {
            let call = decode_call(&tx.input)?;
            (call.method == method).then(|| IouEvent {
                from: tx.from,
                args: call.params,
                timestamp: block.timestamp,
            })
        })
        .collect()
}
