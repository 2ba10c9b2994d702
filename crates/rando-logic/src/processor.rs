//! Infix logic parsing and the macro table
//!
//! Grammar:
//! - `+` (AND) binds tighter than `|` (OR); both are left-associative
//! - parentheses group
//! - `TRUE`/`ANY`, `FALSE`/`NONE` are constants
//! - `A=B`, `A<B`, `A>B` compare two named integers
//! - `*Name` references the logic of another definition
//! - `A?B` coalesces: `A` if it resolves, else `B`
//!
//! Any other run of name characters is a macro when the macro table has it,
//! otherwise a bare name.

use std::collections::{BTreeMap, HashSet};

use rando_core::{RandoError, RandoResult};

use crate::{ComparisonType, LogicClause, LogicToken, OperatorType};

const RESERVED: &str = "+|()=<>*?";

#[inline]
fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !RESERVED.contains(c)
}

#[derive(Clone, Debug, PartialEq)]
enum Lexeme {
    Open,
    Close,
    Op(OperatorType),
    Atom(LogicToken),
}

#[derive(Clone, Copy)]
enum Pending {
    Open,
    Op(OperatorType),
}

/// Parser and macro registry for infix logic
#[derive(Clone, Debug, Default)]
pub struct LogicProcessor {
    macros: BTreeMap<String, LogicClause>,
}

impl LogicProcessor {
    pub fn new() -> Self {
        LogicProcessor::default()
    }

    /// Parse infix text into a postfix clause. `name` identifies the
    /// definition in errors.
    pub fn parse_infix(&self, name: &str, infix: &str) -> RandoResult<LogicClause> {
        self.parse_with(name, infix, &|m| self.macros.contains_key(m))
    }

    pub fn get_macro(&self, name: &str) -> Option<&LogicClause> {
        self.macros.get(name)
    }

    pub fn is_macro(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn macros(&self) -> impl Iterator<Item = (&str, &LogicClause)> {
        self.macros.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Register or replace one macro
    pub fn set_macro(&mut self, name: &str, infix: &str) -> RandoResult<()> {
        let clause = self.parse_infix(name, infix)?;
        self.macros.insert(name.to_string(), clause);
        Ok(())
    }

    /// Register a batch of macros. Names in the batch are known to each
    /// other regardless of order.
    pub fn set_macros<'a, I>(&mut self, macros: I) -> RandoResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let batch: Vec<(&str, &str)> = macros.into_iter().collect();
        let names: HashSet<&str> = batch.iter().map(|(n, _)| *n).collect();
        let mut parsed = Vec::with_capacity(batch.len());
        for (name, infix) in &batch {
            let clause = self.parse_with(name, infix, &|m| {
                names.contains(m) || self.macros.contains_key(m)
            })?;
            parsed.push((name.to_string(), clause));
        }
        self.macros.extend(parsed);
        Ok(())
    }

    fn parse_with(
        &self,
        name: &str,
        infix: &str,
        is_macro: &dyn Fn(&str) -> bool,
    ) -> RandoResult<LogicClause> {
        let parse_error = |message: String| RandoError::Parse {
            name: name.to_string(),
            message,
        };

        let lexemes = tokenize(infix, is_macro).map_err(parse_error)?;
        shunting_yard(lexemes).map_err(parse_error)
    }
}

fn atom(name: String, is_macro: &dyn Fn(&str) -> bool) -> LogicToken {
    match name.as_str() {
        "TRUE" | "ANY" => LogicToken::Const(true),
        "FALSE" | "NONE" => LogicToken::Const(false),
        _ if is_macro(&name) => LogicToken::Macro(name),
        _ => LogicToken::Simple(name),
    }
}

fn read_name(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_name_char(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn skip_whitespace(chars: &[char], i: &mut usize) {
    while *i < chars.len() && chars[*i].is_whitespace() {
        *i += 1;
    }
}

fn tokenize(infix: &str, is_macro: &dyn Fn(&str) -> bool) -> Result<Vec<Lexeme>, String> {
    let chars: Vec<char> = infix.chars().collect();
    let mut lexemes = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => lexemes.push(Lexeme::Open),
            ')' => lexemes.push(Lexeme::Close),
            '+' => lexemes.push(Lexeme::Op(OperatorType::And)),
            '|' => lexemes.push(Lexeme::Op(OperatorType::Or)),
            '*' => {
                i += 1;
                let target = read_name(&chars, &mut i);
                if target.is_empty() {
                    return Err(format!("expected reference target at {}", i));
                }
                lexemes.push(Lexeme::Atom(LogicToken::Reference(target)));
                continue;
            }
            '=' | '<' | '>' | '?' => return Err(format!("unexpected '{}' at {}", c, i)),
            _ => {
                let left = read_name(&chars, &mut i);
                let mut j = i;
                skip_whitespace(&chars, &mut j);

                let next = chars.get(j).copied();
                if let Some(kind) = next.and_then(ComparisonType::from_symbol) {
                    j += 1;
                    skip_whitespace(&chars, &mut j);
                    let right = read_name(&chars, &mut j);
                    if right.is_empty() {
                        return Err(format!("expected right operand of '{}' at {}", kind.symbol(), j));
                    }
                    lexemes.push(Lexeme::Atom(LogicToken::Comparison { kind, left, right }));
                    i = j;
                } else if next == Some('?') {
                    j += 1;
                    skip_whitespace(&chars, &mut j);
                    let right = read_name(&chars, &mut j);
                    if right.is_empty() {
                        return Err(format!("expected right operand of '?' at {}", j));
                    }
                    lexemes.push(Lexeme::Atom(LogicToken::Coalescing {
                        left: Box::new(atom(left, is_macro)),
                        right: Box::new(atom(right, is_macro)),
                    }));
                    i = j;
                } else {
                    lexemes.push(Lexeme::Atom(atom(left, is_macro)));
                }
                continue;
            }
        }
        i += 1;
    }

    Ok(lexemes)
}

fn shunting_yard(lexemes: Vec<Lexeme>) -> Result<LogicClause, String> {
    let mut output = Vec::with_capacity(lexemes.len());
    let mut pending: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    for lexeme in lexemes {
        match lexeme {
            Lexeme::Atom(token) => {
                if !expect_operand {
                    return Err(format!("missing operator before {}", token));
                }
                output.push(token);
                expect_operand = false;
            }
            Lexeme::Open => {
                if !expect_operand {
                    return Err("missing operator before '('".to_string());
                }
                pending.push(Pending::Open);
            }
            Lexeme::Close => {
                if expect_operand {
                    return Err("unexpected ')'".to_string());
                }
                loop {
                    match pending.pop() {
                        Some(Pending::Op(op)) => output.push(LogicToken::Operator(op)),
                        Some(Pending::Open) => break,
                        None => return Err("unbalanced ')'".to_string()),
                    }
                }
            }
            Lexeme::Op(op) => {
                if expect_operand {
                    return Err(format!("missing operand before '{}'", op.symbol()));
                }
                while let Some(Pending::Op(top)) = pending.last().copied() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(LogicToken::Operator(top));
                    pending.pop();
                }
                pending.push(Pending::Op(op));
                expect_operand = true;
            }
        }
    }

    if expect_operand {
        return Err("unexpected end of logic".to_string());
    }
    while let Some(top) = pending.pop() {
        match top {
            Pending::Op(op) => output.push(LogicToken::Operator(op)),
            Pending::Open => return Err("unbalanced '('".to_string()),
        }
    }

    Ok(LogicClause::from_postfix(output))
}
