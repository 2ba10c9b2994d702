//! Extra location costs beyond the location's own logic

use rando_core::{ProgressionState, TermId, TermValue};

use crate::{LogicDef, LogicManager};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogicCost {
    /// The term must have reached the value
    Threshold(TermValue),
    /// The logic must hold
    Logic(LogicDef),
}

impl LogicCost {
    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        match self {
            LogicCost::Threshold(threshold) => state.has_value(*threshold),
            LogicCost::Logic(def) => def.can_get(lm, state),
        }
    }

    pub fn terms(&self, lm: &LogicManager) -> Vec<TermId> {
        match self {
            LogicCost::Threshold(threshold) => vec![threshold.term],
            LogicCost::Logic(def) => def.terms(lm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogicManagerBuilder, RawLogicDef};
    use rando_core::ProgressionManager;

    #[test]
    fn test_threshold_and_logic_costs() {
        let mut lmb = LogicManagerBuilder::new();
        let geo = lmb.get_or_add_term("Geo");
        let dash = lmb.get_or_add_term("Dash");
        let mut lm = lmb.build().unwrap();

        let price = LogicCost::Threshold(TermValue::new(geo, 200));
        let skill = LogicCost::Logic(lm.from_string(&RawLogicDef::new("Skill", "Dash")).unwrap());

        let mut pm = ProgressionManager::new();
        pm.set(geo, 150);
        assert!(!price.can_get(&lm, &pm));
        assert!(!skill.can_get(&lm, &pm));

        pm.increment(geo, 50);
        pm.set(dash, 1);
        assert!(price.can_get(&lm, &pm));
        assert!(skill.can_get(&lm, &pm));

        assert_eq!(price.terms(&lm), vec![geo]);
        assert_eq!(skill.terms(&lm), vec![dash]);
    }
}
