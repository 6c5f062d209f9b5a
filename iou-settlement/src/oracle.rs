//! Balance oracle
//!
//! The only source of truth for how much one identity currently owes
//! another: every answer is a live `lookup` against the ledger. History is
//! never summed to approximate a balance.
//!
//! Fan-out queries run with bounded concurrency and return results in
//! input order. An [`OracleSession`] adds a memo that lives for one
//! top-level request, so path search and netting see the same balances.

use crate::metrics::BALANCE_LOOKUPS_TOTAL;
use crate::types::{IdentitySet, SettlementPath};
use crate::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use iou_ledger::{Identity, Ledger};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of concurrent balance lookups
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Live balance queries against the ledger
#[derive(Debug)]
pub struct BalanceOracle<L: ?Sized> {
    ledger: Arc<L>,
    concurrency: usize,
}

impl<L: Ledger + ?Sized> BalanceOracle<L> {
    /// Create oracle allowing `concurrency` lookups in flight
    pub fn new(ledger: Arc<L>, concurrency: usize) -> Self {
        Self {
            ledger,
            concurrency: concurrency.max(1),
        }
    }

    /// Amount `debtor` currently owes `creditor`
    pub async fn balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32> {
        BALANCE_LOOKUPS_TOTAL.with_label_values(&["ledger"]).inc();
        Ok(self.ledger.lookup_balance(debtor, creditor).await?)
    }

    /// Amounts `debtor` owes each creditor, in input order
    pub async fn balances(&self, debtor: &Identity, creditors: &[Identity]) -> Result<Vec<u32>> {
        stream::iter(creditors)
            .map(|creditor| self.balance(debtor, creditor))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Balance of every edge along `path`, in path order
    pub async fn path_balances(&self, path: &SettlementPath) -> Result<Vec<u32>> {
        stream::iter(path.edges())
            .map(|(debtor, creditor)| async move { self.balance(&debtor, &creditor).await })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Candidates that `node` owes a positive amount, in candidate order
    pub async fn creditors_of(&self, node: &Identity, candidates: &IdentitySet) -> Result<Vec<Identity>> {
        let others: Vec<Identity> = candidates.iter().filter(|c| *c != node).copied().collect();
        let balances = self.balances(node, &others).await?;

        Ok(positive(others, balances))
    }

    /// Start a memoized session for one request
    pub fn session(&self) -> OracleSession<'_, L> {
        OracleSession {
            oracle: self,
            memo: Mutex::new(HashMap::new()),
        }
    }
}

/// Balance queries memoized for the lifetime of one request
#[derive(Debug)]
pub struct OracleSession<'a, L: ?Sized> {
    oracle: &'a BalanceOracle<L>,
    memo: Mutex<HashMap<(Identity, Identity), u32>>,
}

impl<L: Ledger + ?Sized> OracleSession<'_, L> {
    /// Amount `debtor` owes `creditor`, fetched at most once per session
    pub async fn balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32> {
        let key = (*debtor, *creditor);
        let cached = self.memo.lock().get(&key).copied();
        if let Some(amount) = cached {
            BALANCE_LOOKUPS_TOTAL.with_label_values(&["memo"]).inc();
            return Ok(amount);
        }

        let amount = self.oracle.balance(debtor, creditor).await?;
        self.memo.lock().insert(key, amount);
        Ok(amount)
    }

    /// Balance of every edge along `path`, in path order
    pub async fn path_balances(&self, path: &SettlementPath) -> Result<Vec<u32>> {
        stream::iter(path.edges())
            .map(|(debtor, creditor)| async move { self.balance(&debtor, &creditor).await })
            .buffered(self.oracle.concurrency)
            .try_collect()
            .await
    }

    /// Candidates that `node` owes a positive amount, in candidate order
    pub async fn creditors_of(&self, node: &Identity, candidates: &IdentitySet) -> Result<Vec<Identity>> {
        let others: Vec<Identity> = candidates.iter().filter(|c| *c != node).copied().collect();
        let balances: Vec<u32> = stream::iter(&others)
            .map(|creditor| self.balance(node, creditor))
            .buffered(self.oracle.concurrency)
            .try_collect()
            .await?;

        Ok(positive(others, balances))
    }

    /// Number of distinct pairs looked up so far
    pub fn cached_pairs(&self) -> usize {
        self.memo.lock().len()
    }
}

fn positive(candidates: Vec<Identity>, balances: Vec<u32>) -> Vec<Identity> {
    candidates
        .into_iter()
        .zip(balances)
        .filter(|(_, amount)| *amount > 0)
        .map(|(candidate, _)| candidate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use iou_ledger::{Block, BlockId, IouRequest, LocalLedger, Receipt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(byte: u8) -> Identity {
        Identity::with_last_byte(byte)
    }

    async fn ledger_with(debts: &[(u8, u8, u32)]) -> Arc<LocalLedger> {
        let ledger = Arc::new(LocalLedger::spawn(id(0xcc)));
        for &(debtor, creditor, amount) in debts {
            ledger
                .record_iou(IouRequest::plain(id(debtor), id(creditor), amount))
                .await
                .unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_balances_in_order() {
        let ledger = ledger_with(&[(1, 2, 10), (1, 4, 3)]).await;
        let oracle = BalanceOracle::new(ledger.clone(), 2);

        let balances = oracle.balances(&id(1), &[id(4), id(3), id(2)]).await.unwrap();
        assert_eq!(balances, vec![3, 0, 10]);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_creditors_of() {
        let ledger = ledger_with(&[(1, 2, 10), (1, 4, 3), (2, 1, 1)]).await;
        let oracle = BalanceOracle::new(ledger.clone(), DEFAULT_CONCURRENCY);
        let candidates: IdentitySet = [1, 2, 3, 4].into_iter().map(id).collect();

        let creditors = oracle.creditors_of(&id(1), &candidates).await.unwrap();
        assert_eq!(creditors, vec![id(2), id(4)]);

        let session = oracle.session();
        assert_eq!(session.creditors_of(&id(1), &candidates).await.unwrap(), creditors);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_path_balances() {
        let ledger = ledger_with(&[(1, 2, 10), (2, 3, 4)]).await;
        let oracle = BalanceOracle::new(ledger.clone(), DEFAULT_CONCURRENCY);
        let path = SettlementPath::new(vec![id(1), id(2), id(3)]);

        assert_eq!(oracle.path_balances(&path).await.unwrap(), vec![10, 4]);

        ledger.shutdown().await.unwrap();
    }

    /// Ledger counting how often each balance is read
    #[derive(Default)]
    struct CountingLedger {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl Ledger for CountingLedger {
        async fn head(&self) -> iou_ledger::Result<BlockId> {
            Ok(BlockId::Number(0))
        }

        async fn block(&self, id: BlockId) -> iou_ledger::Result<Block> {
            Err(iou_ledger::Error::BlockNotFound(id.to_string()))
        }

        async fn lookup_balance(&self, _: &Identity, _: &Identity) -> iou_ledger::Result<u32> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(5)
        }

        async fn record_iou(&self, _: IouRequest) -> iou_ledger::Result<Receipt> {
            Err(iou_ledger::Error::Rejected("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_session_memoizes() {
        let ledger = Arc::new(CountingLedger::default());
        let oracle = BalanceOracle::new(ledger.clone(), DEFAULT_CONCURRENCY);
        let session = oracle.session();

        assert_eq!(session.balance(&id(1), &id(2)).await.unwrap(), 5);
        assert_eq!(session.balance(&id(1), &id(2)).await.unwrap(), 5);
        let path = SettlementPath::new(vec![id(1), id(2)]);
        assert_eq!(session.path_balances(&path).await.unwrap(), vec![5]);

        assert_eq!(ledger.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(session.cached_pairs(), 1);

        // A fresh session reads again
        oracle.session().balance(&id(1), &id(2)).await.unwrap();
        assert_eq!(ledger.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        struct FailingLedger;

        #[async_trait]
        impl Ledger for FailingLedger {
            async fn head(&self) -> iou_ledger::Result<BlockId> {
                Ok(BlockId::Number(0))
            }

            async fn block(&self, id: BlockId) -> iou_ledger::Result<Block> {
                Err(iou_ledger::Error::BlockNotFound(id.to_string()))
            }

            async fn lookup_balance(&self, _: &Identity, _: &Identity) -> iou_ledger::Result<u32> {
                Err(iou_ledger::Error::Transport("connection refused".into()))
            }

            async fn record_iou(&self, _: IouRequest) -> iou_ledger::Result<Receipt> {
                Err(iou_ledger::Error::Rejected("read-only".into()))
            }
        }

        let oracle = BalanceOracle::new(Arc::new(FailingLedger), DEFAULT_CONCURRENCY);
        let err = oracle.balances(&id(1), &[id(2), id(3)]).await.unwrap_err();

        assert!(err.is_connectivity());
    }
}
