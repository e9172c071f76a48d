use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::model::{Drip, DripId};
use crate::MAX_FALLBACK_DRIPS;

/// Ordered feed queue. The front is the card on screen; consumption only ever
/// pops the front, background refills only ever append to the back, and user
/// submissions prepend. Ids are unique within the queue, earliest-seen wins.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DripQueue {
    items: VecDeque<Drip>,
}

impl DripQueue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn head(&self) -> Option<&Drip> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drip> {
        self.items.iter()
    }

    pub fn contains(&self, id: &DripId) -> bool {
        self.items.iter().any(|d| &d.id == id)
    }

    pub fn find(&self, id: &DripId) -> Option<&Drip> {
        self.items.iter().find(|d| &d.id == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the whole queue (initial load, fallback install, refresh),
    /// deduplicated by id keeping the earliest occurrence.
    pub fn replace(&mut self, drips: Vec<Drip>) {
        self.items.clear();
        let mut seen = HashSet::new();
        for drip in drips {
            if seen.insert(drip.id.clone()) {
                self.items.push_back(drip);
            }
        }
    }

    /// Append refill results behind the current items, skipping ids already
    /// queued. Returns how many items were actually appended.
    pub fn append_back(&mut self, drips: Vec<Drip>) -> usize {
        let mut appended = 0;
        for drip in drips {
            if !self.contains(&drip.id) {
                self.items.push_back(drip);
                appended += 1;
            }
        }
        appended
    }

    /// Prepend a user submission so it becomes the card on screen.
    pub fn push_front(&mut self, drip: Drip) {
        if !self.contains(&drip.id) {
            self.items.push_front(drip);
        }
    }

    pub fn pop_front(&mut self) -> Option<Drip> {
        self.items.pop_front()
    }
}

/// Bounded mirror of the durable "fallback drips" collection: the last known
/// good generation results, capacity 10, most recently saved first, unique by
/// id. Only successful live fetches mutate it.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FallbackStore {
    entries: Vec<Drip>,
}

impl FallbackStore {
    pub fn drips(&self) -> &[Drip] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a fresh batch in front of the existing entries. A re-saved id
    /// takes its new position; the seen-set keeps the merge linear.
    pub fn absorb(&mut self, batch: &[Drip]) {
        let existing = std::mem::take(&mut self.entries);
        self.entries = dedup_keep_first(batch.iter().cloned().chain(existing));
        self.entries.truncate(MAX_FALLBACK_DRIPS);
    }

    /// Merge entries restored from the durable cache *behind* whatever this
    /// session has already recorded, so a slow hydration read cannot clobber
    /// a batch saved moments earlier.
    pub fn hydrate(&mut self, stored: Vec<Drip>) {
        let existing = std::mem::take(&mut self.entries);
        self.entries = dedup_keep_first(existing.into_iter().chain(stored));
        self.entries.truncate(MAX_FALLBACK_DRIPS);
    }
}

fn dedup_keep_first(drips: impl Iterator<Item = Drip>) -> Vec<Drip> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for drip in drips {
        if seen.insert(drip.id.clone()) {
            out.push(drip);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;
    use proptest::prelude::*;

    fn drip(id: &str) -> Drip {
        Drip {
            id: DripId::new(id),
            fact: format!("fact {id}"),
            caption: format!("caption {id}"),
            media_url: format!("asset://{id}"),
            media_kind: MediaKind::Image,
            is_user_generated: false,
            author: None,
        }
    }

    fn ids(drips: &[Drip]) -> Vec<&str> {
        drips.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn replace_dedups_keeping_earliest() {
        let mut queue = DripQueue::default();
        queue.replace(vec![drip("a"), drip("b"), drip("a"), drip("c")]);
        let queued: Vec<_> = queue.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(queued, vec!["a", "b", "c"]);
    }

    #[test]
    fn append_back_skips_already_queued_ids() {
        let mut queue = DripQueue::default();
        queue.replace(vec![drip("a"), drip("b")]);
        let appended = queue.append_back(vec![drip("b"), drip("c")]);
        assert_eq!(appended, 1);
        let queued: Vec<_> = queue.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(queued, vec!["a", "b", "c"]);
        assert_eq!(queue.head().unwrap().id.as_str(), "a");
    }

    #[test]
    fn push_front_makes_the_submission_the_head() {
        let mut queue = DripQueue::default();
        queue.replace(vec![drip("a")]);
        queue.push_front(drip("mine"));
        assert_eq!(queue.head().unwrap().id.as_str(), "mine");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn resaved_id_wins_its_new_position() {
        let mut store = FallbackStore::default();
        store.absorb(&[drip("a"), drip("b")]);
        store.absorb(&[drip("b"), drip("c")]);
        assert_eq!(ids(store.drips()), vec!["b", "c", "a"]);
    }

    #[test]
    fn absorb_truncates_to_capacity() {
        let mut store = FallbackStore::default();
        for round in 0..5 {
            let batch: Vec<_> = (0..4).map(|i| drip(&format!("r{round}-{i}"))).collect();
            store.absorb(&batch);
        }
        assert_eq!(store.len(), MAX_FALLBACK_DRIPS);
        // Newest round sits in front.
        assert_eq!(store.drips()[0].id.as_str(), "r4-0");
    }

    #[test]
    fn hydrate_keeps_session_entries_in_front() {
        let mut store = FallbackStore::default();
        store.absorb(&[drip("fresh")]);
        store.hydrate(vec![drip("old"), drip("fresh")]);
        assert_eq!(ids(store.drips()), vec!["fresh", "old"]);
    }

    proptest! {
        #[test]
        fn fallback_store_stays_bounded_and_unique(
            batches in proptest::collection::vec(
                proptest::collection::vec(0u8..30, 0..8),
                0..12,
            )
        ) {
            let mut store = FallbackStore::default();
            for batch in &batches {
                let drips: Vec<_> = batch.iter().map(|n| drip(&format!("id-{n}"))).collect();
                store.absorb(&drips);
                prop_assert!(store.len() <= MAX_FALLBACK_DRIPS);
                let unique: HashSet<_> = store.drips().iter().map(|d| d.id.clone()).collect();
                prop_assert_eq!(unique.len(), store.len());
            }
        }
    }
}
