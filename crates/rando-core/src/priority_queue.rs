//! Stable binary min-heap
//!
//! Entries are ordered by `(key, arrival)`, where `arrival` is a
//! monotonically increasing counter assigned on enqueue. Equal keys
//! therefore leave the queue first-in first-out.

use std::iter::FusedIterator;

use crate::{RandoError, RandoResult};

const DEFAULT_CAPACITY: usize = 4;

#[derive(Clone, Debug)]
struct PriorityEntry<K, V> {
    key: K,
    arrival: u64,
    value: V,
}

impl<K: Ord, V> PriorityEntry<K, V> {
    #[inline]
    fn precedes(&self, other: &Self) -> bool {
        match self.key.cmp(&other.key) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.arrival < other.arrival,
        }
    }
}

/// Stable min-priority queue
#[derive(Clone, Debug)]
pub struct PriorityQueue<K, V> {
    entries: Vec<PriorityEntry<K, V>>,
    arrival: u64,
}

impl<K: Ord, V> PriorityQueue<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PriorityQueue {
            entries: Vec::with_capacity(capacity),
            arrival: 0,
        }
    }

    /// Build a queue from values, computing each key with `key_of`
    pub fn from_values<I, F>(values: I, mut key_of: F) -> Self
    where
        I: IntoIterator<Item = V>,
        F: FnMut(&V) -> K,
    {
        let values = values.into_iter();
        let mut queue = Self::with_capacity(values.size_hint().0.max(DEFAULT_CAPACITY));
        for value in values {
            let key = key_of(&value);
            queue.enqueue(key, value);
        }
        queue
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Remove everything and restart the arrival counter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.arrival = 0;
    }

    pub fn enqueue(&mut self, key: K, value: V) {
        let i = self.entries.len();
        self.ensure_capacity(i + 1);
        self.entries.push(PriorityEntry {
            key,
            arrival: self.arrival,
            value,
        });
        self.arrival += 1;
        self.sift_up(i);
    }

    /// Minimum entry without removing it
    pub fn try_peek(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|e| (&e.key, &e.value))
    }

    /// Remove and return the minimum entry, or `None` when empty
    pub fn try_extract_min(&mut self) -> Option<(K, V)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let entry = self.entries.pop()?;
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((entry.key, entry.value))
    }

    /// Like [`try_extract_min`](Self::try_extract_min), failing on empty
    pub fn extract_min(&mut self) -> RandoResult<(K, V)> {
        self.try_extract_min().ok_or(RandoError::EmptyQueue)
    }

    /// Replace the key of the minimum entry in place and restore heap order.
    /// The entry keeps its original arrival rank.
    pub fn update_head(&mut self, key: K) -> RandoResult<()> {
        let head = self.entries.first_mut().ok_or(RandoError::EmptyQueue)?;
        head.key = key;
        self.sift_down(0);
        Ok(())
    }

    /// Lazily extract entries in ascending `(key, arrival)` order.
    /// Every yielded entry is removed from the queue.
    pub fn drain_ordered(&mut self) -> DrainOrdered<'_, K, V> {
        DrainOrdered { queue: self }
    }

    /// Entries in heap order; for diagnostics only
    pub fn unordered_items(&self) -> impl ExactSizeIterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    fn ensure_capacity(&mut self, min: usize) {
        let capacity = self.entries.capacity();
        if capacity < min {
            let target = min.max(2 * capacity);
            self.entries.reserve_exact(target - self.entries.len());
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.entries[i].precedes(&self.entries[parent]) {
                break;
            }
            self.entries.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut p: usize) {
        let count = self.entries.len();
        loop {
            let l = 2 * p + 1;
            let r = l + 1;
            if l >= count {
                break;
            }
            let child = if r < count && self.entries[r].precedes(&self.entries[l]) {
                r
            } else {
                l
            };
            if !self.entries[child].precedes(&self.entries[p]) {
                break;
            }
            self.entries.swap(child, p);
            p = child;
        }
    }
}

impl<K: Ord, V> Default for PriorityQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Destructive, ordered view produced by [`PriorityQueue::drain_ordered`]
pub struct DrainOrdered<'a, K: Ord, V> {
    queue: &'a mut PriorityQueue<K, V>,
}

impl<K: Ord, V> Iterator for DrainOrdered<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.try_extract_min()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.queue.len();
        (n, Some(n))
    }
}

impl<K: Ord, V> ExactSizeIterator for DrainOrdered<'_, K, V> {}

impl<K: Ord, V> FusedIterator for DrainOrdered<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_queue() {
        let mut q: PriorityQueue<i32, &str> = PriorityQueue::new();
        assert!(q.try_peek().is_none());
        assert!(q.try_extract_min().is_none());
        assert_eq!(q.extract_min(), Err(RandoError::EmptyQueue));
        assert_eq!(q.update_head(3), Err(RandoError::EmptyQueue));
    }

    #[test]
    fn test_equal_keys_are_fifo() {
        let mut q = PriorityQueue::new();
        q.enqueue(1, "a");
        q.enqueue(0, "b");
        q.enqueue(1, "c");
        q.enqueue(0, "d");

        let order: Vec<&str> = q.drain_ordered().map(|(_, v)| v).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_update_head_resifts() {
        let mut q = PriorityQueue::new();
        q.enqueue(1, "low");
        q.enqueue(5, "mid");
        q.enqueue(9, "high");

        q.update_head(7).unwrap();
        assert_eq!(q.try_peek(), Some((&5, &"mid")));

        let order: Vec<(i32, &str)> = q.drain_ordered().collect();
        assert_eq!(order, vec![(5, "mid"), (7, "low"), (9, "high")]);
    }

    #[test]
    fn test_capacity_doubles() {
        let mut q = PriorityQueue::with_capacity(2);
        for i in 0..3 {
            q.enqueue(i, i);
        }
        assert!(q.capacity() >= 4);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_clear_resets_arrival_order() {
        let mut q = PriorityQueue::new();
        q.enqueue(0, "stale");
        q.clear();
        q.enqueue(2, "x");
        q.enqueue(2, "y");
        assert_eq!(q.extract_min().unwrap(), (2, "x"));
        assert_eq!(q.extract_min().unwrap(), (2, "y"));
    }

    #[test]
    fn test_drain_is_lazy() {
        let mut q = PriorityQueue::from_values(vec![3, 1, 2], |v| *v);
        let first = q.drain_ordered().next();
        assert_eq!(first, Some((1, 1)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_unordered_items_do_not_mutate() {
        let q = PriorityQueue::from_values(vec!["b", "a", "c"], |v| v.to_string());
        let mut seen: Vec<&str> = q.unordered_items().map(|(_, v)| *v).collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(q.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_drain_is_stable_sort(keys in prop::collection::vec(0u8..8, 0..64)) {
            let mut q = PriorityQueue::new();
            for (i, k) in keys.iter().enumerate() {
                q.enqueue(*k, i);
            }

            let drained: Vec<(u8, usize)> = q.drain_ordered().collect();
            let mut expected: Vec<(u8, usize)> = keys.iter().copied().zip(0usize..).collect();
            expected.sort_by_key(|&(k, _)| k);

            prop_assert_eq!(drained, expected);
            prop_assert!(q.is_empty());
        }

        #[test]
        fn prop_size_after_extractions(
            keys in prop::collection::vec(any::<i16>(), 0..64),
            extractions in 0usize..80,
        ) {
            let mut q = PriorityQueue::new();
            for k in &keys {
                q.enqueue(*k, ());
            }

            let mut previous = None;
            for _ in 0..extractions {
                if let Some((k, _)) = q.try_extract_min() {
                    if let Some(p) = previous {
                        prop_assert!(p <= k);
                    }
                    previous = Some(k);
                }
            }

            prop_assert_eq!(q.len(), keys.len() - extractions.min(keys.len()));
        }
    }
}
