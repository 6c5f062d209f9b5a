//! Cycle finder
//!
//! Before recording `debtor -> creditor`, look for an existing chain of
//! debts leading from the creditor back to the debtor. If one exists the
//! new IOU closes a cycle and part of it can be cancelled at write time.
//!
//! # Algorithm
//!
//! Breadth-first search over paths:
//!
//! 1. Start with the single-node path `[start]`
//! 2. Dequeue a path; if it ends at `end`, return it
//! 3. Otherwise expand its last node through `neighbor_fn`, in the order
//!    returned, skipping nodes already reached
//!
//! # Example
//!
//! ```text
//! New IOU: A owes C
//!
//! Existing debts:
//!   C owes B: $15
//!   B owes A: $40
//!
//! Search from C (creditor) to A (debtor):
//!   [C] -> [C, B] -> [C, B, A]   found
//! ```

use crate::types::SettlementPath;
use crate::Result;
use iou_ledger::Identity;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use tracing::debug;

/// Shortest chain of positive debts from `start` to `end`
///
/// `neighbor_fn(node)` returns the identities `node` currently owes a
/// positive amount. Paths longer than `max_edges` are not explored.
/// Returns `None` when no chain exists. Each node is expanded at most once,
/// so the search terminates on cyclic graphs.
pub async fn find_settlement_path<F, Fut>(
    start: Identity,
    end: Identity,
    mut neighbor_fn: F,
    max_edges: Option<usize>,
) -> Result<Option<SettlementPath>>
where
    F: FnMut(Identity) -> Fut,
    Fut: Future<Output = Result<Vec<Identity>>>,
{
    let mut queue = VecDeque::new();
    let mut reached = HashSet::new();
    let mut expanded = 0usize;

    queue.push_back(vec![start]);
    reached.insert(start);

    while let Some(path) = queue.pop_front() {
        let last = match path.last() {
            Some(last) => *last,
            None => continue,
        };

        if last == end {
            debug!(%start, %end, edges = path.len() - 1, expanded, "Settlement path found");
            return Ok(Some(SettlementPath::new(path)));
        }

        if max_edges.is_some_and(|max| path.len() > max) {
            continue;
        }

        expanded += 1;
        for next in neighbor_fn(last).await? {
            if reached.insert(next) {
                let mut extended = path.clone();
                extended.push(next);
                queue.push_back(extended);
            }
        }
    }

    debug!(%start, %end, expanded, "No settlement path");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::HashMap;

    fn id(byte: u8) -> Identity {
        Identity::with_last_byte(byte)
    }

    /// Adjacency list keyed by debtor
    fn graph(edges: &[(u8, u8)]) -> HashMap<Identity, Vec<Identity>> {
        let mut adjacency: HashMap<Identity, Vec<Identity>> = HashMap::new();
        for &(debtor, creditor) in edges {
            adjacency.entry(id(debtor)).or_default().push(id(creditor));
        }
        adjacency
    }

    async fn search(
        edges: &[(u8, u8)],
        start: u8,
        end: u8,
        max_edges: Option<usize>,
    ) -> Option<Vec<Identity>> {
        let adjacency = graph(edges);
        find_settlement_path(
            id(start),
            id(end),
            |node| {
                let neighbors = adjacency.get(&node).cloned().unwrap_or_default();
                async move { Ok(neighbors) }
            },
            max_edges,
        )
        .await
        .unwrap()
        .map(SettlementPath::into_nodes)
    }

    #[tokio::test]
    async fn test_direct_edge() {
        let path = search(&[(2, 1)], 2, 1, None).await;
        assert_eq!(path, Some(vec![id(2), id(1)]));
    }

    #[tokio::test]
    async fn test_shortest_path_wins() {
        // 1 -> 2 -> 3 -> 4 and 1 -> 5 -> 4
        let edges = [(1, 2), (2, 3), (3, 4), (1, 5), (5, 4)];

        let path = search(&edges, 1, 4, None).await;
        assert_eq!(path, Some(vec![id(1), id(5), id(4)]));
    }

    #[tokio::test]
    async fn test_neighbor_order_breaks_ties() {
        // Both 1 -> 2 -> 4 and 1 -> 3 -> 4 have two edges
        let edges = [(1, 3), (1, 2), (3, 4), (2, 4)];

        let path = search(&edges, 1, 4, None).await;
        assert_eq!(path, Some(vec![id(1), id(3), id(4)]));
    }

    #[tokio::test]
    async fn test_no_path() {
        let edges = [(1, 2), (3, 1)];
        assert_eq!(search(&edges, 1, 3, None).await, None);
    }

    #[tokio::test]
    async fn test_cycle_without_target_terminates() {
        let edges = [(1, 2), (2, 3), (3, 1)];
        assert_eq!(search(&edges, 1, 9, None).await, None);
    }

    #[tokio::test]
    async fn test_max_edges() {
        let edges = [(1, 2), (2, 3), (3, 4)];

        assert_eq!(search(&edges, 1, 4, Some(2)).await, None);
        assert_eq!(
            search(&edges, 1, 4, Some(3)).await,
            Some(vec![id(1), id(2), id(3), id(4)])
        );
    }

    #[tokio::test]
    async fn test_neighbor_error_propagates() {
        let result = find_settlement_path(
            id(1),
            id(2),
            |_| async { Err(Error::Other("lookup failed".into())) },
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::Other(_))));
    }
}
