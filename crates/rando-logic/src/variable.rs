//! Computed integer variables
//!
//! A bare name that is not a term is offered to the manager's
//! [`VariableResolver`] the first time it appears. A match registers a
//! [`LogicInt`] in the next variable slot; later uses of the same name hit
//! the cache.

use std::fmt;
use std::sync::Arc;

use rando_core::{ProgressionState, TermId, TermTable};

/// Integer computed from progression state
pub trait LogicInt: fmt::Debug {
    fn name(&self) -> &str;

    /// `requester` names the logic definition being evaluated
    fn value(&self, requester: &str, state: &dyn ProgressionState) -> i32;

    /// Terms the value reads
    fn terms(&self) -> Vec<TermId> {
        Vec::new()
    }
}

/// Integer literal appearing in logic, e.g. the `2` in `Keys>2`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantInt {
    name: String,
    value: i32,
}

impl ConstantInt {
    pub fn new(value: i32) -> Self {
        ConstantInt {
            name: value.to_string(),
            value,
        }
    }
}

impl LogicInt for ConstantInt {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, _requester: &str, _state: &dyn ProgressionState) -> i32 {
        self.value
    }
}

/// Pluggable name matcher consulted for unresolved bare names
pub trait VariableResolver: fmt::Debug {
    fn try_match(&self, terms: &TermTable, name: &str) -> Option<Arc<dyn LogicInt>>;
}

/// Resolves integer literals, then defers to an optional inner resolver
#[derive(Clone, Debug, Default)]
pub struct DefaultVariableResolver {
    inner: Option<Arc<dyn VariableResolver>>,
}

impl DefaultVariableResolver {
    pub fn new() -> Self {
        DefaultVariableResolver::default()
    }

    pub fn with_inner(inner: Arc<dyn VariableResolver>) -> Self {
        DefaultVariableResolver { inner: Some(inner) }
    }
}

impl VariableResolver for DefaultVariableResolver {
    fn try_match(&self, terms: &TermTable, name: &str) -> Option<Arc<dyn LogicInt>> {
        if let Ok(value) = name.parse::<i32>() {
            return Some(Arc::new(ConstantInt::new(value)));
        }
        self.inner.as_ref()?.try_match(terms, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rando_core::ProgressionManager;

    #[derive(Debug)]
    struct Doubled {
        name: String,
        term: TermId,
    }

    impl LogicInt for Doubled {
        fn name(&self) -> &str {
            &self.name
        }

        fn value(&self, _requester: &str, state: &dyn ProgressionState) -> i32 {
            2 * state.get(self.term)
        }

        fn terms(&self) -> Vec<TermId> {
            vec![self.term]
        }
    }

    #[derive(Debug)]
    struct DoubledResolver;

    impl VariableResolver for DoubledResolver {
        fn try_match(&self, terms: &TermTable, name: &str) -> Option<Arc<dyn LogicInt>> {
            let inner = name.strip_prefix("$DOUBLE_")?;
            let term = terms.id_of(inner)?;
            Some(Arc::new(Doubled {
                name: name.to_string(),
                term,
            }))
        }
    }

    #[test]
    fn test_literals_resolve_to_constants() {
        let resolver = DefaultVariableResolver::new();
        let terms = TermTable::new();
        let pm = ProgressionManager::new();

        let three = resolver.try_match(&terms, "3").unwrap();
        assert_eq!(three.name(), "3");
        assert_eq!(three.value("Test", &pm), 3);
        assert!(resolver.try_match(&terms, "Dash").is_none());
    }

    #[test]
    fn test_inner_resolver_chain() {
        let resolver = DefaultVariableResolver::with_inner(Arc::new(DoubledResolver));
        let mut terms = TermTable::new();
        let charms = terms.get_or_add("Charms");
        let mut pm = ProgressionManager::new();
        pm.set(charms, 4);

        let doubled = resolver.try_match(&terms, "$DOUBLE_Charms").unwrap();
        assert_eq!(doubled.value("Test", &pm), 8);
        assert_eq!(doubled.terms(), vec![charms]);
        assert!(resolver.try_match(&terms, "$DOUBLE_Nothing").is_none());
    }
}
