//! Search participants
//!
//! The strategy is generic over anything that exposes a name, a priority
//! and the sphere it became reachable in. [`RandoItem`], [`RandoLocation`]
//! and [`RandoTransition`] are the standard participants built on compiled
//! logic.

use std::cmp::Ordering;

use rando_core::{ProgressionState, TermId};
use rando_logic::{LogicCost, LogicDef, LogicItem, LogicManager, LogicTransition};

/// Progress flag for reachability and placement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TempState {
    #[default]
    None,
    /// Set during the current attempt only
    Temporary,
    Permanent,
}

/// Common view of items and locations
pub trait Participant {
    fn name(&self) -> &str;

    /// Lower is placed earlier
    fn priority(&self) -> f32;

    /// Sphere depth at which this participant became reachable
    fn sphere(&self) -> usize;
}

pub trait PlaceableItem: Participant {}

pub trait PlaceableLocation: Participant {}

/// A participant that is a location in its group and an item in the dual
/// group, such as one side of a two-way transition
pub trait Couple: PlaceableItem + PlaceableLocation {}

/// Canonical order of a pool: priority, then name
pub fn participant_order<P: Participant>(a: &P, b: &P) -> Ordering {
    a.priority()
        .total_cmp(&b.priority())
        .then_with(|| a.name().cmp(b.name()))
}

/// An item placed by the search
#[derive(Clone, Debug, PartialEq)]
pub struct RandoItem {
    pub item: LogicItem,
    pub priority: f32,
    pub sphere: usize,
    pub placed: TempState,
    pub required: bool,
}

impl RandoItem {
    pub fn new(item: LogicItem) -> Self {
        RandoItem {
            item,
            priority: 0.0,
            sphere: 0,
            placed: TempState::None,
            required: false,
        }
    }

    pub fn add_to(&self, lm: &LogicManager, state: &mut dyn ProgressionState) {
        self.item.add_to(lm, state);
    }

    pub fn affected_terms(&self) -> Vec<TermId> {
        self.item.affected_terms()
    }
}

impl Participant for RandoItem {
    fn name(&self) -> &str {
        self.item.name()
    }

    fn priority(&self) -> f32 {
        self.priority
    }

    fn sphere(&self) -> usize {
        self.sphere
    }
}

impl PlaceableItem for RandoItem {}

/// A location gated by logic and optional extra costs
#[derive(Clone, Debug, PartialEq)]
pub struct RandoLocation {
    pub logic: LogicDef,
    pub costs: Vec<LogicCost>,
    pub priority: f32,
    pub sphere: usize,
    pub reachable: TempState,
}

impl RandoLocation {
    pub fn new(logic: LogicDef) -> Self {
        RandoLocation {
            logic,
            costs: Vec::new(),
            priority: 0.0,
            sphere: 0,
            reachable: TempState::None,
        }
    }

    pub fn add_cost(&mut self, cost: LogicCost) {
        self.costs.push(cost);
    }

    /// Every cost and the location logic must hold
    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        self.costs.iter().all(|cost| cost.can_get(lm, state)) && self.logic.can_get(lm, state)
    }

    /// Terms read by the logic and costs
    pub fn terms(&self, lm: &LogicManager) -> Vec<TermId> {
        let mut terms = self.logic.terms(lm);
        for term in self.costs.iter().flat_map(|cost| cost.terms(lm)) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }
}

impl Participant for RandoLocation {
    fn name(&self) -> &str {
        self.logic.name()
    }

    fn priority(&self) -> f32 {
        self.priority
    }

    fn sphere(&self) -> usize {
        self.sphere
    }
}

impl PlaceableLocation for RandoLocation {}

/// A transition endpoint; both a target and a source of placements
#[derive(Clone, Debug, PartialEq)]
pub struct RandoTransition {
    pub transition: LogicTransition,
    pub priority: f32,
    pub sphere: usize,
    pub placed: TempState,
}

impl RandoTransition {
    pub fn new(transition: LogicTransition) -> Self {
        RandoTransition {
            transition,
            priority: 0.0,
            sphere: 0,
            placed: TempState::None,
        }
    }

    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        self.transition.can_get(lm, state)
    }

    /// Granting a transition sets its term
    pub fn add_to(&self, state: &mut dyn ProgressionState) {
        state.set(self.transition.term, 1);
    }
}

impl Participant for RandoTransition {
    fn name(&self) -> &str {
        &self.transition.name
    }

    fn priority(&self) -> f32 {
        self.priority
    }

    fn sphere(&self) -> usize {
        self.sphere
    }
}

impl PlaceableItem for RandoTransition {}
impl PlaceableLocation for RandoTransition {}
impl Couple for RandoTransition {}

#[cfg(test)]
mod tests {
    use super::*;
    use rando_core::{ProgressionManager, TermValue};
    use rando_logic::{LogicManagerBuilder, RawLogicDef};

    #[test]
    fn test_location_requires_costs_and_logic() {
        let mut lmb = LogicManagerBuilder::new();
        let dash = lmb.get_or_add_term("Dash");
        let geo = lmb.get_or_add_term("Geo");
        lmb.add_logic_def(RawLogicDef::new("Shop", "Dash")).unwrap();
        let lm = lmb.build().unwrap();

        let mut shop = RandoLocation::new(lm.get_logic_def("Shop").unwrap().clone());
        shop.add_cost(LogicCost::Threshold(TermValue::new(geo, 100)));
        assert_eq!(shop.name(), "Shop");
        assert_eq!(shop.terms(&lm), vec![dash, geo]);

        let mut pm = ProgressionManager::new();
        pm.set(dash, 1);
        assert!(!shop.can_get(&lm, &pm));
        pm.set(geo, 100);
        assert!(shop.can_get(&lm, &pm));
    }

    #[test]
    fn test_participant_order() {
        let mut lmb = LogicManagerBuilder::new();
        let a = lmb.get_or_add_term("A");
        let lm = lmb.build().unwrap();

        let item = |name: &str, priority: f32| {
            let mut ri = RandoItem::new(LogicItem::Bool {
                name: name.into(),
                term: a,
            });
            ri.priority = priority;
            ri
        };
        assert_eq!(participant_order(&item("B", 0.1), &item("A", 0.2)), Ordering::Less);
        assert_eq!(participant_order(&item("A", 0.5), &item("B", 0.5)), Ordering::Less);

        let mut pm = ProgressionManager::new();
        item("A", 0.0).add_to(&lm, &mut pm);
        assert_eq!(pm.get(a), 1);
    }
}
