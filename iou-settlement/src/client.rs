//! IOU client
//!
//! Orchestrates history scanning, path search, netting and the ledger
//! write behind four operations.
//!
//! ```text
//! read:   scan ──► graph / aggregate ──► caller
//! write:  scan ──► find path ──► net ──► record_iou
//! ```

use crate::{
    config::Config,
    cycle::find_settlement_path,
    graph::potential_creditors,
    metrics::record_write,
    netting::compute_netting,
    oracle::BalanceOracle,
    query,
    scanner::HistoryScanner,
    types::{AccountSummary, IdentitySet, IouEvent, IouOutcome},
    Error, Result,
};
use iou_ledger::abi::ADD_IOU;
use iou_ledger::{Identity, Ledger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Credit network client over a shared ledger connection
#[derive(Debug)]
pub struct IouClient<L: ?Sized> {
    /// Ledger connection
    ledger: Arc<L>,

    /// Address of the IOU contract
    contract: Identity,

    /// History scanner
    scanner: HistoryScanner<L>,

    /// Live balances
    oracle: BalanceOracle<L>,

    /// Longest settlement path explored
    max_path_len: Option<usize>,
}

impl<L: Ledger + ?Sized> IouClient<L> {
    /// Create client for the contract at `contract`
    pub fn new(ledger: Arc<L>, contract: Identity, config: &Config) -> Self {
        let scanner = HistoryScanner::new(ledger.clone(), config.scan.options());
        let oracle = BalanceOracle::new(ledger.clone(), config.search.lookup_concurrency);

        Self {
            ledger,
            contract,
            scanner,
            oracle,
            max_path_len: config.search.max_path_len,
        }
    }

    /// Abort history scans when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.scanner = self.scanner.with_cancellation(cancel);
        self
    }

    /// Address of the IOU contract
    pub fn contract(&self) -> Identity {
        self.contract
    }

    async fn events(&self) -> Result<Vec<IouEvent>> {
        self.scanner.scan(&self.contract, ADD_IOU).await
    }

    /// Every identity that has sent or received an IOU
    pub async fn get_users(&self) -> Result<IdentitySet> {
        Ok(query::all_users(&self.events().await?))
    }

    /// Sum of live balances `user` owes every known creditor
    pub async fn get_total_owed(&self, user: &Identity) -> Result<u64> {
        let events = self.events().await?;
        query::total_owed(&self.oracle, user, &potential_creditors(&events)).await
    }

    /// Timestamp of the latest IOU involving `user`
    pub async fn get_last_active(&self, user: &Identity) -> Result<Option<u64>> {
        Ok(query::last_active(&self.events().await?, user))
    }

    /// Total owed and last activity from one history scan
    pub async fn get_summary(&self, user: &Identity) -> Result<AccountSummary> {
        let events = self.events().await?;
        query::summary(&self.oracle, &events, user).await
    }

    /// Record that `caller` owes `creditor` `amount`, netting any cycle it closes
    pub async fn add_iou(&self, caller: &Identity, creditor: &Identity, amount: u32) -> Result<IouOutcome> {
        if caller == creditor {
            return Err(Error::InvalidRequest(format!("{} cannot owe itself", caller)));
        }
        if amount == 0 {
            return Err(Error::InvalidRequest("amount must be positive".to_string()));
        }

        let events = self.events().await?;
        let candidates = potential_creditors(&events);
        let session = self.oracle.session();

        let path = {
            let session = &session;
            let candidates = &candidates;
            find_settlement_path(
                *creditor,
                *caller,
                move |node| async move { session.creditors_of(&node, candidates).await },
                self.max_path_len,
            )
            .await?
        };

        let edge_balances = match &path {
            Some(path) => session.path_balances(path).await?,
            None => Vec::new(),
        };
        let plan = compute_netting(path, &edge_balances, amount)?;
        let netted = plan.path.is_some();

        tracing::info!(
            caller = %caller,
            creditor = %creditor,
            amount,
            net_amount = plan.net_amount,
            path = %plan.path.as_ref().map(ToString::to_string).unwrap_or_default(),
            path_edges = plan.path.as_ref().map(|p| p.edge_count()).unwrap_or(0),
            lookups = session.cached_pairs(),
            "Submitting IOU"
        );

        let request = plan.into_request(*caller, *creditor, amount);
        match self.ledger.record_iou(request.clone()).await {
            Ok(receipt) => {
                record_write(netted, true);
                Ok(IouOutcome { request, receipt })
            }
            Err(e) => {
                record_write(netted, false);
                tracing::warn!(caller = %caller, creditor = %creditor, error = %e, "IOU write failed");
                Err(e.into())
            }
        }
    }
}
