//! Term identity types
//!
//! Terms are allocated once, in order, and their ids are dense: the n-th
//! registered name always receives id n. A term id doubles as a direct
//! index into progression state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense term identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u32);

impl TermId {
    pub const ZERO: TermId = TermId(0);

    #[inline]
    pub fn new(id: u32) -> Self {
        TermId(id)
    }

    /// Index into dense per-term storage
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Encoding of this term inside a packed logic program
    #[inline]
    pub fn to_code(self) -> i32 {
        self.0 as i32
    }

    /// Decode a non-negative program symbol as a term id
    #[inline]
    pub fn from_code(code: i32) -> Option<Self> {
        if code >= 0 {
            Some(TermId(code as u32))
        } else {
            None
        }
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({})", self.0)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named integer-valued quantity in progression state
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    pub id: TermId,
    pub name: String,
}

impl Term {
    pub fn new(id: TermId, name: impl Into<String>) -> Self {
        Term {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A term paired with an amount: an increment for item effects, a
/// threshold for caps and costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TermValue {
    pub term: TermId,
    pub value: i32,
}

impl TermValue {
    #[inline]
    pub fn new(term: TermId, value: i32) -> Self {
        TermValue { term, value }
    }
}

/// Sequentially allocated term registry
#[derive(Clone, Debug, Default)]
pub struct TermTable {
    terms: Vec<Term>,
    lookup: HashMap<String, TermId>,
}

impl TermTable {
    pub fn new() -> Self {
        TermTable::default()
    }

    /// Return the id registered for `name`, allocating the next one if absent.
    pub fn get_or_add(&mut self, name: &str) -> TermId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = TermId::new(self.terms.len() as u32);
        self.terms.push(Term::new(id, name));
        self.lookup.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.lookup.get(name).map(|id| &self.terms[id.index()])
    }

    #[inline]
    pub fn id_of(&self, name: &str) -> Option<TermId> {
        self.lookup.get(name).copied()
    }

    #[inline]
    pub fn by_id(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.index())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in id order
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }
}
