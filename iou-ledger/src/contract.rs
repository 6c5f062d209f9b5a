//! IOU contract rules
//!
//! State is a map of directed balances `debt[debtor][creditor]`. A write
//! either records a plain debt or records a debt while cancelling
//! `min_on_cycle` around the cycle formed by the new edge and an existing
//! chain of debts `[creditor, .., sender]`.
//!
//! # Example
//!
//! ```text
//! Existing:  B owes C 5, C owes A 8
//! A writes:  add_IOU(creditor = B, amount = 10, path = [B, C, A], min = 5)
//!
//! Result:    A owes B 5, B owes C 0, C owes A 3
//! ```
//!
//! # Invariants
//!
//! - Writes are all-or-nothing: a rejected write leaves state untouched
//! - Net position (owed to minus owing) of every account changes exactly as
//!   it would for a plain write of the same amount
//! - Zero balances are not stored

use crate::types::Identity;
use crate::{Error, Result};
use std::collections::HashMap;

/// Balances held by the contract
#[derive(Debug, Clone, Default)]
pub struct ContractState {
    debts: HashMap<(Identity, Identity), u32>,
}

impl ContractState {
    /// Empty contract
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount `debtor` owes `creditor`
    pub fn lookup(&self, debtor: &Identity, creditor: &Identity) -> u32 {
        self.debts.get(&(*debtor, *creditor)).copied().unwrap_or(0)
    }

    /// All positive balances as `(debtor, creditor, amount)`
    #[cfg(test)]
    fn balances(&self) -> impl Iterator<Item = (Identity, Identity, u32)> + '_ {
        self.debts.iter().map(|(&(d, c), &amount)| (d, c, amount))
    }

    /// Execute `add_IOU` sent by `sender`
    pub fn add_iou(
        &mut self,
        sender: Identity,
        creditor: Identity,
        amount: u32,
        path: &[Identity],
        min_on_cycle: u32,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::Rejected("Amount must be positive".to_string()));
        }
        if creditor == sender {
            return Err(Error::Rejected("Cannot owe yourself".to_string()));
        }

        let mut staged: HashMap<(Identity, Identity), u32> = HashMap::new();

        if path.is_empty() {
            if min_on_cycle != 0 {
                return Err(Error::Rejected(
                    "Netting amount given without a path".to_string(),
                ));
            }
        } else {
            if path.first() != Some(&creditor) || path.last() != Some(&sender) {
                return Err(Error::Rejected(
                    "Path must run from creditor to sender".to_string(),
                ));
            }
            if min_on_cycle > amount {
                return Err(Error::Rejected(format!(
                    "Netting amount {} exceeds IOU amount {}",
                    min_on_cycle, amount
                )));
            }

            for edge in path.windows(2) {
                let key = (edge[0], edge[1]);
                let current = staged
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| self.lookup(&edge[0], &edge[1]));
                let reduced = current.checked_sub(min_on_cycle).ok_or_else(|| {
                    Error::Rejected(format!(
                        "{} owes {} only {}, cannot net {}",
                        edge[0], edge[1], current, min_on_cycle
                    ))
                })?;
                staged.insert(key, reduced);
            }
        }

        let key = (sender, creditor);
        let current = staged
            .get(&key)
            .copied()
            .unwrap_or_else(|| self.lookup(&sender, &creditor));
        let increased = current
            .checked_add(amount - min_on_cycle)
            .ok_or_else(|| Error::Rejected("Balance overflows uint32".to_string()))?;
        staged.insert(key, increased);

        for (key, value) in staged {
            if value == 0 {
                self.debts.remove(&key);
            } else {
                self.debts.insert(key, value);
            }
        }

        Ok(())
    }
}
