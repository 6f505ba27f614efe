//! Per-tag subscriber table.
//!
//! The table owns id allocation for one event tag. Ids start at zero, grow by
//! one per `add` and are never recycled, so ascending id order is exactly
//! subscription order.

use std::collections::BTreeMap;

use herald_core::SubscriberId;

/// Ordered map from subscriber id to handler for a single event tag.
///
/// Cloning a table (with `H` being a cheap handle such as an `Arc`) yields the
/// snapshot a broadcast pass iterates over.
#[derive(Debug, Clone)]
pub struct SubscriberTable<H> {
    next_id: SubscriberId,
    entries: BTreeMap<SubscriberId, H>,
}

impl<H> SubscriberTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under a fresh id and return that id.
    pub fn add(&mut self, handler: H) -> SubscriberId {
        let id = self.next_id;
        self.next_id = id.successor();
        self.entries.insert(id, handler);
        id
    }

    /// Remove the handler for `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit every handler in subscription order.
    ///
    /// The first `Err` returned by `visit` ends the pass; remaining handlers
    /// are not visited and the error is handed back to the caller.
    pub fn try_for_each<F, Err>(&self, mut visit: F) -> Result<(), Err>
    where
        F: FnMut(SubscriberId, &H) -> Result<(), Err>,
    {
        for (id, handler) in &self.entries {
            visit(*id, handler)?;
        }
        Ok(())
    }
}

impl<H> Default for SubscriberTable<H> {
    fn default() -> Self {
        Self {
            next_id: SubscriberId::new(0),
            entries: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_hands_out_increasing_ids() {
        let mut table = SubscriberTable::new();

        for i in 0..10u64 {
            assert_eq!(table.add(()), SubscriberId::new(i));
        }
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn remove_unknown_id_is_false() {
        let mut table = SubscriberTable::new();
        let id = table.add(());

        assert!(!table.remove(id.successor()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_existing_id_is_true_once() {
        let mut table = SubscriberTable::new();
        let first = table.add(());
        table.add(());

        assert!(table.remove(first));
        assert!(!table.remove(first));
        assert!(!table.contains(first));
    }

    #[test]
    fn ids_are_not_recycled_after_removal() {
        let mut table = SubscriberTable::new();
        let a = table.add(());
        table.remove(a);

        assert_eq!(table.add(()), SubscriberId::new(1));
        assert!(!table.is_empty());
    }

    #[test]
    fn try_for_each_skips_removed_entries() {
        let mut table = SubscriberTable::new();
        table.add(1);
        let middle = table.add(2);
        table.add(3);
        table.remove(middle);

        let mut sum = 0;
        table
            .try_for_each(|_, value| {
                sum += *value;
                Ok::<_, ()>(())
            })
            .unwrap();

        assert_eq!(sum, 4);
    }

    #[test]
    fn try_for_each_stops_at_first_error() {
        let mut table = SubscriberTable::new();
        for value in ["a", "b", "fail", "d"] {
            table.add(value);
        }

        let mut seen = Vec::new();
        let result = table.try_for_each(|id, value| {
            seen.push(*value);
            if *value == "fail" { Err(id) } else { Ok(()) }
        });

        assert_eq!(result, Err(SubscriberId::new(2)));
        assert_eq!(seen, vec!["a", "b", "fail"]);
    }

    #[test]
    fn clone_is_independent_snapshot() {
        let mut table = SubscriberTable::new();
        table.add("a");
        let snapshot = table.clone();
        table.add("b");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.len(), 2);
    }

    proptest! {
        /// Property: visiting order equals insertion order, whatever was removed.
        #[test]
        fn visit_order_matches_insertion_order(
            removals in prop::collection::vec(any::<bool>(), 1..64)
        ) {
            let mut table = SubscriberTable::new();
            let mut expected = Vec::new();

            for (i, remove) in removals.iter().enumerate() {
                let id = table.add(i);
                if *remove {
                    table.remove(id);
                } else {
                    expected.push(i);
                }
            }

            let mut visited = Vec::new();
            table.try_for_each(|_, v| { visited.push(*v); Ok::<_, ()>(()) }).unwrap();
            prop_assert_eq!(visited, expected);
        }
    }
}
