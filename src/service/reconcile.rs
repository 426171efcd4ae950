//! Set reconciliation for tags and shares.
//!
//! Given the rows currently stored and the keys a caller asked for, work out
//! the smallest set of inserts and deletes that makes the stored key set
//! equal to the requested one. Requested duplicates collapse and ordering
//! never matters.

use std::collections::HashSet;
use std::hash::Hash;

use crate::db::{Id, Share, Tag};

/// Rows to delete and keys to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<R, K> {
    /// New keys, in first-requested order.
    pub insert: Vec<K>,
    /// Stored rows whose key was not requested, in stored order.
    pub delete: Vec<R>,
}

impl<R, K> Reconciliation<R, K> {
    /// No stored row changes.
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.delete.is_empty()
    }
}

/// Diff `current` rows (keyed by `key`) against the `requested` keys.
pub fn reconcile<R, K, F>(current: &[R], key: F, requested: &[K]) -> Reconciliation<R, K>
where
    R: Clone,
    K: Eq + Hash + Clone,
    F: Fn(&R) -> &K,
{
    let wanted: HashSet<&K> = requested.iter().collect();
    let mut kept: HashSet<&K> = HashSet::with_capacity(current.len());
    let mut delete = Vec::new();

    for row in current {
        let k = key(row);
        // A second stored row with an already kept key is surplus
        if !wanted.contains(k) || !kept.insert(k) {
            delete.push(row.clone());
        }
    }

    let mut seen: HashSet<&K> = HashSet::with_capacity(requested.len());
    let insert = requested
        .iter()
        .filter(|k| !kept.contains(*k) && seen.insert(*k))
        .cloned()
        .collect();

    Reconciliation { insert, delete }
}

/// Tag names to add and tag rows to drop.
pub fn reconcile_tags(current: &[Tag], requested: &[String]) -> Reconciliation<Tag, String> {
    reconcile(current, |tag: &Tag| &tag.name, requested)
}

/// Users to share with and share rows to drop. The owner is left out of both sides.
pub fn reconcile_shares(
    owner_id: Id,
    current: &[Share],
    requested: &[Id],
) -> Reconciliation<Share, Id> {
    let current: Vec<Share> = current
        .iter()
        .filter(|share| share.user_id != owner_id)
        .cloned()
        .collect();
    let requested: Vec<Id> = requested
        .iter()
        .copied()
        .filter(|user_id| *user_id != owner_id)
        .collect();

    reconcile(&current, |share: &Share| &share.user_id, &requested)
}
