//! Packed logic programs
//!
//! A compiled logic program is a flat postfix sequence of `i32` symbols
//! sharing one integer space:
//! - `>= 0`: term id
//! - `-1 ..= -7`: operator code
//! - `<= VARIABLE_OFFSET`: variable slot, encoded as `VARIABLE_OFFSET - index`
//!
//! Comparisons are fully postfix (`left right OP`), like the boolean
//! operators. Codes between the operator range and the variable range are
//! never emitted.

use std::fmt;

use crate::TermId;

/// First variable code; slot `i` is encoded as `VARIABLE_OFFSET - i`
pub const VARIABLE_OFFSET: i32 = -100;

/// Operator codes of the packed program alphabet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LogicOperator {
    /// Binary conjunction
    And = -1,
    /// Binary disjunction
    Or = -2,
    /// Nullary, always true
    Any = -3,
    /// Nullary, always false
    None = -4,
    /// Binary integer equality
    Eq = -5,
    /// Binary integer less-than
    Lt = -6,
    /// Binary integer greater-than
    Gt = -7,
}

impl LogicOperator {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(LogicOperator::And),
            -2 => Some(LogicOperator::Or),
            -3 => Some(LogicOperator::Any),
            -4 => Some(LogicOperator::None),
            -5 => Some(LogicOperator::Eq),
            -6 => Some(LogicOperator::Lt),
            -7 => Some(LogicOperator::Gt),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Number of stack operands consumed
    #[inline]
    pub fn arity(self) -> usize {
        match self {
            LogicOperator::Any | LogicOperator::None => 0,
            _ => 2,
        }
    }

    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            LogicOperator::Eq | LogicOperator::Lt | LogicOperator::Gt
        )
    }
}

/// Typed view of one packed program symbol
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramSymbol {
    Term(TermId),
    Variable(usize),
    Operator(LogicOperator),
}

impl ProgramSymbol {
    pub fn decode(code: i32) -> Option<Self> {
        if let Some(term) = TermId::from_code(code) {
            Some(ProgramSymbol::Term(term))
        } else if let Some(index) = variable_index(code) {
            Some(ProgramSymbol::Variable(index))
        } else {
            LogicOperator::from_code(code).map(ProgramSymbol::Operator)
        }
    }

    pub fn encode(self) -> i32 {
        match self {
            ProgramSymbol::Term(term) => term.to_code(),
            ProgramSymbol::Variable(index) => variable_code(index),
            ProgramSymbol::Operator(op) => op.code(),
        }
    }
}

impl fmt::Debug for ProgramSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramSymbol::Term(term) => write!(f, "{:?}", term),
            ProgramSymbol::Variable(index) => write!(f, "Var({})", index),
            ProgramSymbol::Operator(op) => write!(f, "{:?}", op),
        }
    }
}

/// Encode variable slot `index`
#[inline]
pub fn variable_code(index: usize) -> i32 {
    VARIABLE_OFFSET - index as i32
}

/// Decode a variable code back to its slot, if it lies in the variable range
#[inline]
pub fn variable_index(code: i32) -> Option<usize> {
    if code <= VARIABLE_OFFSET {
        Some((VARIABLE_OFFSET - code) as usize)
    } else {
        None
    }
}

/// Check that `program` runs on a fixed-arity stack machine and leaves
/// exactly one value. Returns the offending position otherwise; an
/// unbalanced tail reports `program.len()`.
pub fn check_well_formed(program: &[i32]) -> Result<(), usize> {
    let mut depth = 0usize;
    for (position, &code) in program.iter().enumerate() {
        match ProgramSymbol::decode(code) {
            Some(ProgramSymbol::Term(_)) | Some(ProgramSymbol::Variable(_)) => depth += 1,
            Some(ProgramSymbol::Operator(op)) => {
                let arity = op.arity();
                if depth < arity {
                    return Err(position);
                }
                depth = depth - arity + 1;
            }
            None => return Err(position),
        }
    }
    if depth == 1 {
        Ok(())
    } else {
        Err(program.len())
    }
}
