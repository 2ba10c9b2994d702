//! Stack interpreter for packed logic programs
//!
//! One left-to-right pass over an `i32` value stack. A term pushes its
//! current value, a variable pushes its computed value, and truth is
//! `value > 0`. Binary operators pop the right operand first. Evaluation
//! only reads progression state.

use rando_core::{LogicOperator, ProgramSymbol, ProgressionState};

use crate::LogicManager;

/// Evaluate `program` as a boolean
pub fn evaluate(
    lm: &LogicManager,
    requester: &str,
    program: &[i32],
    state: &dyn ProgressionState,
) -> bool {
    evaluate_value(lm, requester, program, state) > 0
}

/// Evaluate `program`, returning the value left on the stack
pub fn evaluate_value(
    lm: &LogicManager,
    requester: &str,
    program: &[i32],
    state: &dyn ProgressionState,
) -> i32 {
    let mut stack: Vec<i32> = Vec::with_capacity(program.len().min(16));

    for &code in program {
        let value = match ProgramSymbol::decode(code) {
            Some(ProgramSymbol::Term(term)) => state.get(term),
            Some(ProgramSymbol::Variable(_)) => lm.evaluate_variable(requester, state, code),
            Some(ProgramSymbol::Operator(op)) => apply_operator(op, &mut stack),
            // never emitted by the compiler
            None => 0,
        };
        stack.push(value);
    }

    stack.pop().unwrap_or(0)
}

fn apply_operator(op: LogicOperator, stack: &mut Vec<i32>) -> i32 {
    match op {
        LogicOperator::Any => 1,
        LogicOperator::None => 0,
        LogicOperator::And => {
            let (left, right) = pop_pair(stack);
            (left > 0 && right > 0) as i32
        }
        LogicOperator::Or => {
            let (left, right) = pop_pair(stack);
            (left > 0 || right > 0) as i32
        }
        LogicOperator::Eq => {
            let (left, right) = pop_pair(stack);
            (left == right) as i32
        }
        LogicOperator::Lt => {
            let (left, right) = pop_pair(stack);
            (left < right) as i32
        }
        LogicOperator::Gt => {
            let (left, right) = pop_pair(stack);
            (left > right) as i32
        }
    }
}

#[inline]
fn pop_pair(stack: &mut Vec<i32>) -> (i32, i32) {
    let right = stack.pop().unwrap_or(0);
    let left = stack.pop().unwrap_or(0);
    (left, right)
}
