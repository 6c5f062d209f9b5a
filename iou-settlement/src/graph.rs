//! Credit graph builder
//!
//! Folds scanned events into the participant sets the rest of the client
//! works from. Edges are never materialized here; their amounts come from
//! the balance oracle on demand.

use crate::types::{IdentitySet, IouEvent};

/// Everyone who sent an IOU or was named as its creditor
pub fn distinct_identities(events: &[IouEvent]) -> IdentitySet {
    let mut users = IdentitySet::new();
    for event in events {
        users.insert(event.from);
        if let Some(creditor) = event.creditor() {
            users.insert(creditor);
        }
    }
    users
}

/// Everyone ever named as a creditor
pub fn potential_creditors(events: &[IouEvent]) -> IdentitySet {
    events.iter().filter_map(IouEvent::creditor).collect()
}
