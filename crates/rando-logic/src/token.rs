//! Logic tokens and clauses
//!
//! A [`LogicClause`] is the parsed form of one infix logic string: its
//! tokens in postfix order. Clauses are the unit the builder stores and
//! the compiler flattens into packed programs.

use std::fmt;

/// Binary boolean operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorType {
    Or,
    And,
}

impl OperatorType {
    /// Binding strength; higher binds tighter
    #[inline]
    pub fn precedence(self) -> u8 {
        match self {
            OperatorType::Or => 0,
            OperatorType::And => 1,
        }
    }

    #[inline]
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorType::Or => "|",
            OperatorType::And => "+",
        }
    }
}

/// Integer comparisons between two named quantities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonType {
    Eq,
    Lt,
    Gt,
}

impl ComparisonType {
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            ComparisonType::Eq => '=',
            ComparisonType::Lt => '<',
            ComparisonType::Gt => '>',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '=' => Some(ComparisonType::Eq),
            '<' => Some(ComparisonType::Lt),
            '>' => Some(ComparisonType::Gt),
            _ => None,
        }
    }
}

/// The fundamental unit of tokenized logic
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicToken {
    /// `+` or `|`
    Operator(OperatorType),
    /// A bare name: a term or a variable
    Simple(String),
    /// `left=right`, `left<right`, `left>right`
    Comparison {
        kind: ComparisonType,
        left: String,
        right: String,
    },
    /// `TRUE` / `FALSE`
    Const(bool),
    /// A named clause from the processor's macro table, inlined at compile time
    Macro(String),
    /// `*Name`: the logic of another definition
    Reference(String),
    /// `left?right`: `left` when it resolves, otherwise `right`
    Coalescing {
        left: Box<LogicToken>,
        right: Box<LogicToken>,
    },
}

impl LogicToken {
    pub const TRUE: LogicToken = LogicToken::Const(true);
    pub const FALSE: LogicToken = LogicToken::Const(false);

    pub fn simple(name: impl Into<String>) -> Self {
        LogicToken::Simple(name.into())
    }

    pub fn comparison(kind: ComparisonType, left: impl Into<String>, right: impl Into<String>) -> Self {
        LogicToken::Comparison {
            kind,
            left: left.into(),
            right: right.into(),
        }
    }

    #[inline]
    pub fn is_operator(&self) -> bool {
        matches!(self, LogicToken::Operator(_))
    }

    /// Infix text of this token alone
    pub fn write(&self) -> String {
        match self {
            LogicToken::Operator(op) => op.symbol().to_string(),
            LogicToken::Simple(name) | LogicToken::Macro(name) => name.clone(),
            LogicToken::Comparison { kind, left, right } => {
                format!("{}{}{}", left, kind.symbol(), right)
            }
            LogicToken::Const(true) => "TRUE".to_string(),
            LogicToken::Const(false) => "FALSE".to_string(),
            LogicToken::Reference(target) => format!("*{}", target),
            LogicToken::Coalescing { left, right } => {
                format!("{}?{}", left.write(), right.write())
            }
        }
    }
}

impl fmt::Display for LogicToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.write())
    }
}

/// Postfix token sequence of one logic expression
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogicClause {
    tokens: Vec<LogicToken>,
}

impl LogicClause {
    /// Wrap postfix tokens, rejecting sequences that do not reduce to a
    /// single expression. The error is the offending token position.
    pub fn new(tokens: Vec<LogicToken>) -> Result<Self, usize> {
        let mut depth = 0usize;
        for (position, token) in tokens.iter().enumerate() {
            if token.is_operator() {
                if depth < 2 {
                    return Err(position);
                }
                depth -= 1;
            } else {
                depth += 1;
            }
        }
        if depth == 1 {
            Ok(LogicClause { tokens })
        } else {
            Err(tokens.len())
        }
    }

    /// Callers guarantee the stack discipline
    pub(crate) fn from_postfix(tokens: Vec<LogicToken>) -> Self {
        LogicClause { tokens }
    }

    /// Single-token clause
    pub fn atom(token: LogicToken) -> Self {
        LogicClause {
            tokens: vec![token],
        }
    }

    /// `self op other`
    pub fn combine(&self, other: &LogicClause, op: OperatorType) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + other.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.extend_from_slice(&other.tokens);
        tokens.push(LogicToken::Operator(op));
        LogicClause { tokens }
    }

    pub fn tokens(&self) -> &[LogicToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Infix text with the minimal parentheses precedence requires
    pub fn to_infix(&self) -> String {
        // (text, precedence of the outermost operator; atoms bind tightest)
        let mut stack: Vec<(String, u8)> = Vec::new();
        for token in &self.tokens {
            match token {
                LogicToken::Operator(op) => {
                    let p = op.precedence();
                    let right = stack.pop().unwrap_or_default();
                    let left = stack.pop().unwrap_or_default();
                    let text = format!(
                        "{} {} {}",
                        parenthesize(left, p),
                        op.symbol(),
                        parenthesize(right, p)
                    );
                    stack.push((text, p));
                }
                other => stack.push((other.write(), u8::MAX)),
            }
        }
        stack.pop().map(|(text, _)| text).unwrap_or_default()
    }
}

fn parenthesize((text, precedence): (String, u8), outer: u8) -> String {
    if precedence < outer {
        format!("({})", text)
    } else {
        text
    }
}

impl fmt::Display for LogicClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_infix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_precedence() {
        assert!(OperatorType::And.precedence() > OperatorType::Or.precedence());
        assert_eq!(OperatorType::And.symbol(), "+");
    }

    #[test]
    fn test_token_write() {
        assert_eq!(LogicToken::TRUE.write(), "TRUE");
        assert_eq!(
            LogicToken::comparison(ComparisonType::Gt, "Keys", "2").write(),
            "Keys>2"
        );
        assert_eq!(LogicToken::Reference("Hub".into()).write(), "*Hub");
        let coalesce = LogicToken::Coalescing {
            left: Box::new(LogicToken::simple("A")),
            right: Box::new(LogicToken::FALSE),
        };
        assert_eq!(coalesce.write(), "A?FALSE");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(LogicToken::simple("Dash"), LogicToken::simple("Dash"));
        assert_ne!(LogicToken::simple("Dash"), LogicToken::Macro("Dash".into()));
    }

    #[test]
    fn test_clause_rejects_bad_postfix() {
        let and = LogicToken::Operator(OperatorType::And);
        assert_eq!(LogicClause::new(vec![LogicToken::simple("A"), and.clone()]), Err(1));
        assert_eq!(
            LogicClause::new(vec![LogicToken::simple("A"), LogicToken::simple("B")]),
            Err(2)
        );
        assert!(LogicClause::new(vec![
            LogicToken::simple("A"),
            LogicToken::simple("B"),
            and
        ])
        .is_ok());
    }

    #[test]
    fn test_infix_parenthesizes_lower_precedence() {
        let a = LogicClause::atom(LogicToken::simple("A"));
        let b = LogicClause::atom(LogicToken::simple("B"));
        let c = LogicClause::atom(LogicToken::simple("C"));

        let or = a.combine(&b, OperatorType::Or);
        assert_eq!(or.combine(&c, OperatorType::And).to_infix(), "(A | B) + C");

        let and = a.combine(&b, OperatorType::And);
        assert_eq!(and.combine(&c, OperatorType::Or).to_infix(), "A + B | C");
    }
}
