//! Per-tag owner index.
//!
//! Maps a caller-chosen [`OwnerKey`] to every subscriber id registered under
//! it for one tag, so a component can drop all of its subscriptions at once.

use std::collections::{HashMap, HashSet};

use herald_core::{OwnerKey, SubscriberId};

/// Unordered owner → subscriber ids association for a single event tag.
#[derive(Debug, Clone, Default)]
pub struct OwnerIndex {
    owners: HashMap<OwnerKey, HashSet<SubscriberId>>,
}

impl OwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `id` with `owner`. Adding the same pair twice is a no-op.
    pub fn add(&mut self, owner: OwnerKey, id: SubscriberId) {
        self.owners.entry(owner).or_default().insert(id);
    }

    /// Detach `owner` and return every id it had, or `None` if it is unknown.
    pub fn remove(&mut self, owner: &OwnerKey) -> Option<HashSet<SubscriberId>> {
        self.owners.remove(owner)
    }

    /// Drop `id` from every owner holding it.
    ///
    /// Owners left without ids are removed entirely. Returns whether any
    /// owner referenced `id`.
    pub fn forget(&mut self, id: SubscriberId) -> bool {
        let mut found = false;
        self.owners.retain(|_, ids| {
            found |= ids.remove(&id);
            !ids.is_empty()
        });
        found
    }

    pub fn contains_owner(&self, owner: &OwnerKey) -> bool {
        self.owners.contains_key(owner)
    }

    /// Number of distinct owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
