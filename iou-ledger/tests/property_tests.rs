//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Balance conservation: plain IOUs add up per (debtor, creditor) pair
//! - Backward-linked history: every block reaches the origin
//! - Atomicity: rejected writes leave balances and history untouched

use iou_ledger::{BlockId, Error, Identity, IouRequest, Ledger, LocalLedger};
use proptest::prelude::*;
use std::collections::HashMap;

const PARTIES: u8 = 5;

/// Strategy for generating a plain IOU between two distinct parties
fn plain_iou_strategy() -> impl Strategy<Value = (u8, u8, u32)> {
    (1..=PARTIES, 1..=PARTIES, 1u32..10_000)
        .prop_filter("self IOUs are rejected", |(debtor, creditor, _)| debtor != creditor)
}

fn id(byte: u8) -> Identity {
    Identity::with_last_byte(byte)
}

fn contract() -> Identity {
    Identity::with_last_byte(0xcc)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: balances equal the sum of recorded plain IOUs
    #[test]
    fn prop_plain_ious_accumulate(ious in prop::collection::vec(plain_iou_strategy(), 1..20)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = LocalLedger::spawn(contract());
            let mut expected: HashMap<(u8, u8), u32> = HashMap::new();

            for &(debtor, creditor, amount) in &ious {
                ledger
                    .record_iou(IouRequest::plain(id(debtor), id(creditor), amount))
                    .await
                    .unwrap();
                *expected.entry((debtor, creditor)).or_insert(0) += amount;
            }

            for debtor in 1..=PARTIES {
                for creditor in 1..=PARTIES {
                    let balance = ledger.lookup_balance(&id(debtor), &id(creditor)).await.unwrap();
                    let want = expected.get(&(debtor, creditor)).copied().unwrap_or(0);
                    prop_assert_eq!(balance, want);
                }
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: walking parent links from the head visits every block once
    #[test]
    fn prop_history_reaches_origin(ious in prop::collection::vec(plain_iou_strategy(), 0..15)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = LocalLedger::spawn(contract());

            for &(debtor, creditor, amount) in &ious {
                ledger
                    .record_iou(IouRequest::plain(id(debtor), id(creditor), amount))
                    .await
                    .unwrap();
            }

            let mut current = ledger.block(ledger.head().await.unwrap()).await.unwrap();
            let mut visited = 1;
            let mut transactions = current.transactions.len();

            while current.has_parent() {
                let parent = ledger.block(BlockId::Hash(current.parent_hash)).await.unwrap();
                prop_assert_eq!(parent.number + 1, current.number);
                prop_assert!(parent.timestamp <= current.timestamp);
                transactions += parent.transactions.len();
                current = parent;
                visited += 1;
            }

            // Genesis plus one block per IOU
            prop_assert_eq!(visited, ious.len() + 1);
            prop_assert_eq!(transactions, ious.len());

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: a netting amount above any edge on the path is rejected atomically
    #[test]
    fn prop_overdrawn_cycle_rejected(owed in 1u32..1_000, extra in 1u32..1_000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = LocalLedger::spawn(contract());

            // Chain 3 -> 2 -> 1; the new IOU 1 -> 3 closes the cycle
            ledger.record_iou(IouRequest::plain(id(3), id(2), owed + extra)).await.unwrap();
            ledger.record_iou(IouRequest::plain(id(2), id(1), owed)).await.unwrap();
            let head_before = ledger.head().await.unwrap();

            let amount = owed + extra;
            let result = ledger
                .record_iou(IouRequest {
                    debtor: id(1),
                    creditor: id(3),
                    amount,
                    settlement_path: vec![id(3), id(2), id(1)],
                    net_amount: owed + 1,
                })
                .await;

            prop_assert!(matches!(result, Err(Error::Rejected(_))));
            prop_assert_eq!(ledger.lookup_balance(&id(3), &id(2)).await.unwrap(), owed + extra);
            prop_assert_eq!(ledger.lookup_balance(&id(2), &id(1)).await.unwrap(), owed);
            prop_assert_eq!(ledger.lookup_balance(&id(1), &id(3)).await.unwrap(), 0);
            prop_assert_eq!(ledger.head().await.unwrap(), head_before);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}
