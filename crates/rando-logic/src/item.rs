//! Logic items
//!
//! An item is the effect granting it has on progression state. Effects are
//! not idempotent; callers apply each grant exactly once. `Branched` reads
//! state when applied, so grants must be applied in sphere order.

use rando_core::{ProgressionState, RandoError, RandoResult, TermId, TermValue};

use crate::{LogicDef, LogicManager};

/// Closed family of item effects
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogicItem {
    /// Sets `term` to 1
    Bool { name: String, term: TermId },
    /// Adds one increment
    Single { name: String, effect: TermValue },
    /// Adds several increments
    Multi { name: String, effects: Vec<TermValue> },
    /// Adds `effects` only while `cap` has not been reached
    Capped {
        name: String,
        effects: Vec<TermValue>,
        cap: TermValue,
    },
    /// Applies `true_item` if `logic` holds at grant time, else `false_item`
    Branched {
        name: String,
        logic: LogicDef,
        true_item: Option<Box<LogicItem>>,
        false_item: Option<Box<LogicItem>>,
    },
    /// No effect
    Empty { name: String },
}

impl LogicItem {
    pub fn name(&self) -> &str {
        match self {
            LogicItem::Bool { name, .. }
            | LogicItem::Single { name, .. }
            | LogicItem::Multi { name, .. }
            | LogicItem::Capped { name, .. }
            | LogicItem::Branched { name, .. }
            | LogicItem::Empty { name } => name,
        }
    }

    /// Apply the grant to `state`
    pub fn add_to(&self, lm: &LogicManager, state: &mut dyn ProgressionState) {
        match self {
            LogicItem::Bool { term, .. } => state.set(*term, 1),
            LogicItem::Single { effect, .. } => state.apply(*effect),
            LogicItem::Multi { effects, .. } => {
                effects.iter().for_each(|effect| state.apply(*effect))
            }
            LogicItem::Capped { effects, cap, .. } => {
                if !state.has_value(*cap) {
                    effects.iter().for_each(|effect| state.apply(*effect));
                }
            }
            LogicItem::Branched {
                logic,
                true_item,
                false_item,
                ..
            } => {
                let branch = if logic.can_get(lm, &*state) {
                    true_item
                } else {
                    false_item
                };
                if let Some(item) = branch {
                    item.add_to(lm, state);
                }
            }
            LogicItem::Empty { .. } => {}
        }
    }

    /// Whether [`remove_from`](Self::remove_from) exactly undoes a grant
    pub fn is_removable(&self) -> bool {
        matches!(self, LogicItem::Single { .. } | LogicItem::Multi { .. })
    }

    /// Undo one prior grant
    pub fn remove_from(&self, state: &mut dyn ProgressionState) -> RandoResult<()> {
        match self {
            LogicItem::Single { effect, .. } => {
                state.increment(effect.term, -effect.value);
                Ok(())
            }
            LogicItem::Multi { effects, .. } => {
                for effect in effects {
                    state.increment(effect.term, -effect.value);
                }
                Ok(())
            }
            other => Err(RandoError::NotRemovable(other.name().to_string())),
        }
    }

    /// Every term [`add_to`](Self::add_to) can write
    pub fn affected_terms(&self) -> Vec<TermId> {
        let mut terms = Vec::new();
        self.collect_affected(&mut terms);
        terms
    }

    fn collect_affected(&self, terms: &mut Vec<TermId>) {
        match self {
            LogicItem::Bool { term, .. } => push_unique(terms, *term),
            LogicItem::Single { effect, .. } => push_unique(terms, effect.term),
            LogicItem::Multi { effects, .. } | LogicItem::Capped { effects, .. } => {
                for effect in effects {
                    push_unique(terms, effect.term);
                }
            }
            LogicItem::Branched {
                true_item,
                false_item,
                ..
            } => {
                for item in [true_item, false_item].into_iter().flatten() {
                    item.collect_affected(terms);
                }
            }
            LogicItem::Empty { .. } => {}
        }
    }
}

fn push_unique(terms: &mut Vec<TermId>, term: TermId) {
    if !terms.contains(&term) {
        terms.push(term);
    }
}
