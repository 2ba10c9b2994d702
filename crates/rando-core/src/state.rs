//! Progression state
//!
//! Logic evaluation and item effects are written strictly against the
//! [`ProgressionState`] interface. [`ProgressionManager`] is a dense
//! term-indexed implementation for drivers that have nothing better.

use crate::{TermId, TermValue};

/// Mutable record of term values reached so far in one attempt
pub trait ProgressionState {
    /// Current value of a term; unknown terms read as zero
    fn get(&self, term: TermId) -> i32;

    /// Add `delta` to a term
    fn increment(&mut self, term: TermId, delta: i32);

    /// Overwrite a term
    fn set(&mut self, term: TermId, value: i32);

    /// Boolean view of a term
    #[inline]
    fn has(&self, term: TermId) -> bool {
        self.get(term) > 0
    }

    /// Whether a term has reached a threshold
    #[inline]
    fn has_value(&self, threshold: TermValue) -> bool {
        self.get(threshold.term) >= threshold.value
    }

    #[inline]
    fn apply(&mut self, effect: TermValue) {
        self.increment(effect.term, effect.value);
    }
}

/// Dense progression state indexed by term id
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressionManager {
    values: Vec<i32>,
}

impl ProgressionManager {
    pub fn new() -> Self {
        ProgressionManager::default()
    }

    /// Pre-size for a known term count
    pub fn with_terms(term_count: usize) -> Self {
        ProgressionManager {
            values: vec![0; term_count],
        }
    }

    /// Raw values in term id order
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Zero every term, keeping the allocation
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0);
    }

    #[inline]
    fn slot(&mut self, term: TermId) -> &mut i32 {
        let index = term.index();
        if index >= self.values.len() {
            self.values.resize(index + 1, 0);
        }
        &mut self.values[index]
    }
}

impl ProgressionState for ProgressionManager {
    #[inline]
    fn get(&self, term: TermId) -> i32 {
        self.values.get(term.index()).copied().unwrap_or(0)
    }

    fn increment(&mut self, term: TermId, delta: i32) {
        *self.slot(term) += delta;
    }

    fn set(&mut self, term: TermId, value: i32) {
        *self.slot(term) = value;
    }
}
