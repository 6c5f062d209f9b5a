//! Core types for the settlement client

use iou_ledger::abi::CallValue;
use iou_ledger::{Identity, IouRequest, Receipt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One historical `add_IOU` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouEvent {
    /// Sender of the call (the debtor)
    pub from: Identity,

    /// Decoded parameters in declaration order
    pub args: Vec<CallValue>,

    /// Timestamp of the including block (seconds)
    pub timestamp: u64,
}

impl IouEvent {
    /// Creditor argument, if the first parameter is an address
    pub fn creditor(&self) -> Option<Identity> {
        self.args.first().and_then(CallValue::as_identity)
    }

    /// Whether `user` took part as sender or creditor
    pub fn involves(&self, user: &Identity) -> bool {
        self.from == *user || self.creditor().as_ref() == Some(user)
    }
}

/// De-duplicated identities in ascending byte order
///
/// The iteration order is deterministic, so anything that walks the set
/// (such as path search tie-breaking) is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentitySet(BTreeSet<Identity>);

impl IdentitySet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity; returns false if it was already present
    pub fn insert(&mut self, identity: Identity) -> bool {
        self.0.insert(identity)
    }

    /// Membership test
    pub fn contains(&self, identity: &Identity) -> bool {
        self.0.contains(identity)
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &Identity> + '_ {
        self.0.iter()
    }
}

impl FromIterator<Identity> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Identity> for IdentitySet {
    fn extend<I: IntoIterator<Item = Identity>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for IdentitySet {
    type Item = Identity;
    type IntoIter = std::collections::btree_set::IntoIter<Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a IdentitySet {
    type Item = &'a Identity;
    type IntoIter = std::collections::btree_set::Iter<'a, Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Chain of debts `[creditor, .., debtor]`
///
/// Each consecutive pair `(p[i-1], p[i])` is an edge where `p[i-1]` owes
/// `p[i]`. Together with a new IOU `debtor -> creditor` it closes a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementPath(Vec<Identity>);

impl SettlementPath {
    /// Wrap a node sequence
    pub fn new(nodes: Vec<Identity>) -> Self {
        Self(nodes)
    }

    /// Nodes in order
    pub fn nodes(&self) -> &[Identity] {
        &self.0
    }

    /// Number of debt edges
    pub fn edge_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Debt edges as `(debtor, creditor)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (Identity, Identity)> + '_ {
        self.0.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Unwrap into the node sequence
    pub fn into_nodes(self) -> Vec<Identity> {
        self.0
    }
}

impl fmt::Display for SettlementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

/// Netting decision for one new IOU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Path to net against, if a cycle exists
    pub path: Option<SettlementPath>,

    /// Smallest balance along the path
    pub min_on_path: Option<u32>,

    /// Amount cancelled around the cycle
    pub net_amount: u32,
}

impl SettlementPlan {
    /// Plan with nothing to net
    pub fn unsettled() -> Self {
        Self {
            path: None,
            min_on_path: None,
            net_amount: 0,
        }
    }

    /// Ledger write carrying this plan
    pub fn into_request(self, debtor: Identity, creditor: Identity, amount: u32) -> IouRequest {
        IouRequest {
            debtor,
            creditor,
            amount,
            settlement_path: self.path.map(SettlementPath::into_nodes).unwrap_or_default(),
            net_amount: self.net_amount,
        }
    }
}

/// Result of a successful `add_iou`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouOutcome {
    /// Write as submitted
    pub request: IouRequest,

    /// Inclusion proof
    pub receipt: Receipt,
}

/// Account panel figures for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account
    pub user: Identity,

    /// Sum of live balances owed to every known creditor
    pub total_owed: u64,

    /// Latest event timestamp involving the user
    pub last_active: Option<u64>,
}
