//! Netting calculator
//!
//! Decides how much of a new IOU can be cancelled against an existing
//! chain of debts.
//!
//! # Algorithm
//!
//! 1. Read the live balance of every edge along the settlement path
//! 2. Take the minimum flow along the path
//! 3. Net amount is the smaller of that minimum and the new IOU amount
//!
//! # Example
//!
//! ```text
//! New IOU: A owes C $10
//!
//! Settlement path [C, B, A]:
//!   C owes B: $15
//!   B owes A: $40
//!
//! Minimum on path: $15
//! Net amount: min($15, $10) = $10
//!
//! After the write:
//!   C owes B: $5
//!   B owes A: $30
//!   A owes C: $0
//! ```

use crate::types::{SettlementPath, SettlementPlan};
use crate::{Error, Result};

/// Smallest balance among the path edges; `None` when there are no edges
pub fn min_on_path(edge_balances: &[u32]) -> Option<u32> {
    edge_balances.iter().copied().min()
}

/// Amount cancelled around the cycle for a new IOU of `amount`
pub fn net_amount(min_on_path: u32, amount: u32) -> u32 {
    min_on_path.min(amount)
}

/// Build the netting plan for a new IOU
///
/// `edge_balances` must hold one live balance per edge of `path`, in path
/// order. Without a path nothing is netted.
pub fn compute_netting(
    path: Option<SettlementPath>,
    edge_balances: &[u32],
    amount: u32,
) -> Result<SettlementPlan> {
    let path = match path {
        Some(path) => path,
        None => return Ok(SettlementPlan::unsettled()),
    };

    if path.edge_count() == 0 {
        return Err(Error::InvalidPath(format!(
            "path with {} node(s) has no edges",
            path.nodes().len()
        )));
    }

    if edge_balances.len() != path.edge_count() {
        return Err(Error::InvalidPath(format!(
            "{} balances for {} edges",
            edge_balances.len(),
            path.edge_count()
        )));
    }

    let min = min_on_path(edge_balances)
        .ok_or_else(|| Error::InvalidPath("no edge balances".to_string()))?;

    Ok(SettlementPlan {
        path: Some(path),
        min_on_path: Some(min),
        net_amount: net_amount(min, amount),
    })
}
