//! Aggregate queries
//!
//! Answers the account-panel questions from one scanned history plus live
//! balances. Nothing is cached between calls.

use crate::graph::{distinct_identities, potential_creditors};
use crate::oracle::BalanceOracle;
use crate::types::{AccountSummary, IdentitySet, IouEvent};
use crate::Result;
use iou_ledger::{Identity, Ledger};

/// Every participant in the history
pub fn all_users(events: &[IouEvent]) -> IdentitySet {
    distinct_identities(events)
}

/// Sum of what `user` currently owes each of `creditors`
///
/// Summed in 64 bits; many uint32 balances cannot overflow it.
pub async fn total_owed<L: Ledger + ?Sized>(
    oracle: &BalanceOracle<L>,
    user: &Identity,
    creditors: &IdentitySet,
) -> Result<u64> {
    let creditors: Vec<Identity> = creditors.iter().copied().collect();
    let balances = oracle.balances(user, &creditors).await?;

    Ok(balances.into_iter().map(u64::from).sum())
}

/// Latest timestamp of any event `user` took part in
pub fn last_active(events: &[IouEvent], user: &Identity) -> Option<u64> {
    events
        .iter()
        .filter(|event| event.involves(user))
        .map(|event| event.timestamp)
        .max()
}

/// Total owed and last activity from a single history
pub async fn summary<L: Ledger + ?Sized>(
    oracle: &BalanceOracle<L>,
    events: &[IouEvent],
    user: &Identity,
) -> Result<AccountSummary> {
    let creditors = potential_creditors(events);

    Ok(AccountSummary {
        user: *user,
        total_owed: total_owed(oracle, user, &creditors).await?,
        last_active: last_active(events, user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iou_ledger::abi::CallValue;
    use iou_ledger::{IouRequest, LocalLedger};
    use std::sync::Arc;

    fn id(byte: u8) -> Identity {
        Identity::with_last_byte(byte)
    }

    fn event(from: u8, creditor: u8, timestamp: u64) -> IouEvent {
        IouEvent {
            from: id(from),
            args: vec![CallValue::Address(id(creditor)), CallValue::Uint(1)],
            timestamp,
        }
    }

    #[test]
    fn test_last_active() {
        let events = vec![event(1, 2, 100), event(3, 1, 300), event(2, 3, 500)];

        assert_eq!(last_active(&events, &id(1)), Some(300));
        assert_eq!(last_active(&events, &id(2)), Some(500));
        assert_eq!(last_active(&events, &id(9)), None);
    }

    #[test]
    fn test_all_users() {
        let events = vec![event(1, 2, 0), event(2, 1, 0)];
        assert_eq!(all_users(&events).len(), 2);
        assert!(all_users(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_total_owed_sums_live_balances() {
        let ledger = Arc::new(LocalLedger::spawn(id(0xcc)));
        ledger.record_iou(IouRequest::plain(id(1), id(2), 10)).await.unwrap();
        ledger.record_iou(IouRequest::plain(id(1), id(3), 7)).await.unwrap();
        ledger.record_iou(IouRequest::plain(id(2), id(1), 4)).await.unwrap();

        let oracle = BalanceOracle::new(ledger.clone(), 4);
        let creditors: IdentitySet = [1, 2, 3].into_iter().map(id).collect();

        assert_eq!(total_owed(&oracle, &id(1), &creditors).await.unwrap(), 17);
        assert_eq!(total_owed(&oracle, &id(2), &creditors).await.unwrap(), 4);
        assert_eq!(total_owed(&oracle, &id(3), &creditors).await.unwrap(), 0);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_total_owed_exceeds_u32() {
        let ledger = Arc::new(LocalLedger::spawn(id(0xcc)));
        ledger.record_iou(IouRequest::plain(id(1), id(2), u32::MAX)).await.unwrap();
        ledger.record_iou(IouRequest::plain(id(1), id(3), u32::MAX)).await.unwrap();

        let oracle = BalanceOracle::new(ledger.clone(), 4);
        let creditors: IdentitySet = [2, 3].into_iter().map(id).collect();

        assert_eq!(
            total_owed(&oracle, &id(1), &creditors).await.unwrap(),
            2 * u64::from(u32::MAX)
        );

        ledger.shutdown().await.unwrap();
    }
}
