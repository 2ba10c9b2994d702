//! Sorted, rank-queryable array
//!
//! Backs the per-sphere location pools and the running sphere priority
//! history of the placement search. Insertion is stable: an element goes
//! after every element comparing equal to it.

use std::cmp::Ordering;
use std::fmt;

/// Total order used by a [`SortedArrayList`]
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Ascending order for float keys, NaN last
pub fn ascending_f32(a: &f32, b: &f32) -> Ordering {
    a.total_cmp(b)
}

/// Ordered sequence with binary-search rank queries
#[derive(Clone)]
pub struct SortedArrayList<T> {
    items: Vec<T>,
    cmp: Comparator<T>,
}

impl<T> SortedArrayList<T> {
    pub fn new(cmp: Comparator<T>) -> Self {
        SortedArrayList {
            items: Vec::new(),
            cmp,
        }
    }

    /// Collect and stably sort
    pub fn from_iter_with<I: IntoIterator<Item = T>>(items: I, cmp: Comparator<T>) -> Self {
        let mut items: Vec<T> = items.into_iter().collect();
        items.sort_by(cmp);
        SortedArrayList { items, cmp }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn min(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Insert keeping order; returns the index used
    pub fn insert(&mut self, item: T) -> usize {
        let index = self.upper_bound(&item);
        self.items.insert(index, item);
        index
    }

    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn try_extract_min(&mut self) -> Option<T> {
        self.remove_at(0)
    }

    /// Number of elements ordered at or before `probe`
    pub fn count_le(&self, probe: &T) -> usize {
        self.upper_bound(probe)
    }

    /// Number of elements ordered strictly before `probe`
    pub fn count_lt(&self, probe: &T) -> usize {
        self.lower_bound(probe)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn lower_bound(&self, probe: &T) -> usize {
        let cmp = self.cmp;
        self.items
            .partition_point(|x| cmp(x, probe) == Ordering::Less)
    }

    fn upper_bound(&self, probe: &T) -> usize {
        let cmp = self.cmp;
        self.items
            .partition_point(|x| cmp(x, probe) != Ordering::Greater)
    }
}

impl<T: PartialEq> SortedArrayList<T> {
    /// Index of an element equal to `item`, searched within its order class
    pub fn position(&self, item: &T) -> Option<usize> {
        let lo = self.lower_bound(item);
        let hi = self.upper_bound(item);
        (lo..hi).find(|&i| self.items[i] == *item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    /// Remove one element equal to `item`
    pub fn remove(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedArrayList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a SortedArrayList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
