//! Compiled logic definitions, waypoints and transitions

use std::sync::Arc;

use rando_core::{check_well_formed, ProgramSymbol, ProgressionState, RandoError, RandoResult, TermId};

use crate::{evaluator, LogicManager, OneWayType};

/// Named, compiled logic program
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogicDef {
    name: String,
    program: Arc<[i32]>,
}

impl LogicDef {
    /// Compiler output is well-formed by construction
    pub(crate) fn compiled(name: impl Into<String>, program: Vec<i32>) -> Self {
        LogicDef {
            name: name.into(),
            program: program.into(),
        }
    }

    /// Wrap a hand-built program after checking its stack discipline
    pub fn from_program(name: impl Into<String>, program: Vec<i32>) -> RandoResult<Self> {
        let name = name.into();
        if let Err(position) = check_well_formed(&program) {
            return Err(RandoError::MalformedProgram { name, position });
        }
        Ok(LogicDef::compiled(name, program))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &[i32] {
        &self.program
    }

    /// Evaluate against progression state
    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        evaluator::evaluate(lm, &self.name, &self.program, state)
    }

    /// Distinct terms the program reads, directly or through variables,
    /// in first-seen order
    pub fn terms(&self, lm: &LogicManager) -> Vec<TermId> {
        let mut terms = Vec::new();
        for &code in self.program.iter() {
            match ProgramSymbol::decode(code) {
                Some(ProgramSymbol::Term(term)) => push_unique(&mut terms, term),
                Some(ProgramSymbol::Variable(_)) => {
                    if let Some(variable) = lm.get_variable(code) {
                        for term in variable.terms() {
                            push_unique(&mut terms, term);
                        }
                    }
                }
                _ => {}
            }
        }
        terms
    }
}

fn push_unique(terms: &mut Vec<TermId>, term: TermId) {
    if !terms.contains(&term) {
        terms.push(term);
    }
}

/// A term that becomes set whenever its logic is satisfied
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicWaypoint {
    pub term: TermId,
    pub logic: LogicDef,
}

impl LogicWaypoint {
    pub fn name(&self) -> &str {
        self.logic.name()
    }

    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        self.logic.can_get(lm, state)
    }
}

/// A scene gate: a term for having reached it plus the logic to reach it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicTransition {
    pub name: String,
    pub scene: String,
    pub gate: String,
    pub term: TermId,
    pub logic: LogicDef,
    pub one_way: OneWayType,
}

impl LogicTransition {
    pub fn can_get(&self, lm: &LogicManager, state: &dyn ProgressionState) -> bool {
        self.logic.can_get(lm, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rando_core::LogicOperator;

    #[test]
    fn test_from_program_checks_shape() {
        let ok = LogicDef::from_program("Ok", vec![0, 1, LogicOperator::Or.code()]);
        assert!(ok.is_ok());

        let err = LogicDef::from_program("Bad", vec![0, LogicOperator::Or.code()]).unwrap_err();
        assert_eq!(
            err,
            RandoError::MalformedProgram {
                name: "Bad".into(),
                position: 1
            }
        );
    }
}
