//! Deferred item construction
//!
//! Templates carry term *names*. They resolve against a compiled manager in
//! a separate [`ItemTemplate::create`] pass, so item documents can be read
//! before the term table is frozen.

use serde::{Deserialize, Serialize};

use rando_core::{RandoResult, TermValue};

use crate::{LogicItem, LogicManager, RawLogicDef};

/// An unresolved `(term, value)` pair
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawTermValue {
    pub term: String,
    pub value: i32,
}

impl RawTermValue {
    pub fn new(term: impl Into<String>, value: i32) -> Self {
        RawTermValue {
            term: term.into(),
            value,
        }
    }

    fn resolve(&self, lm: &LogicManager) -> RandoResult<TermValue> {
        Ok(TermValue::new(lm.get_term_strict(&self.term)?, self.value))
    }
}

/// Serialized form of a [`LogicItem`], discriminated by `"type"`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemTemplate {
    Bool {
        name: String,
        term: String,
    },
    Single {
        name: String,
        effect: RawTermValue,
    },
    Multi {
        name: String,
        effects: Vec<RawTermValue>,
    },
    Capped {
        name: String,
        effects: Vec<RawTermValue>,
        cap: RawTermValue,
    },
    Branched {
        name: String,
        logic: String,
        #[serde(rename = "trueItem", default, skip_serializing_if = "Option::is_none")]
        true_item: Option<Box<ItemTemplate>>,
        #[serde(rename = "falseItem", default, skip_serializing_if = "Option::is_none")]
        false_item: Option<Box<ItemTemplate>>,
    },
    Empty {
        name: String,
    },
}

impl ItemTemplate {
    pub fn name(&self) -> &str {
        match self {
            ItemTemplate::Bool { name, .. }
            | ItemTemplate::Single { name, .. }
            | ItemTemplate::Multi { name, .. }
            | ItemTemplate::Capped { name, .. }
            | ItemTemplate::Branched { name, .. }
            | ItemTemplate::Empty { name } => name,
        }
    }

    /// Resolve names against `lm`. Term lookups are strict; branch guards
    /// are compiled and may register new variables.
    pub fn create(&self, lm: &mut LogicManager) -> RandoResult<LogicItem> {
        let item = match self {
            ItemTemplate::Bool { name, term } => LogicItem::Bool {
                name: name.clone(),
                term: lm.get_term_strict(term)?,
            },
            ItemTemplate::Single { name, effect } => LogicItem::Single {
                name: name.clone(),
                effect: effect.resolve(lm)?,
            },
            ItemTemplate::Multi { name, effects } => LogicItem::Multi {
                name: name.clone(),
                effects: resolve_all(effects, lm)?,
            },
            ItemTemplate::Capped { name, effects, cap } => LogicItem::Capped {
                name: name.clone(),
                effects: resolve_all(effects, lm)?,
                cap: cap.resolve(lm)?,
            },
            ItemTemplate::Branched {
                name,
                logic,
                true_item,
                false_item,
            } => {
                let logic = lm.from_string(&RawLogicDef::new(name.clone(), logic.clone()))?;
                let true_item = match true_item {
                    Some(template) => Some(Box::new(template.create(lm)?)),
                    None => None,
                };
                let false_item = match false_item {
                    Some(template) => Some(Box::new(template.create(lm)?)),
                    None => None,
                };
                LogicItem::Branched {
                    name: name.clone(),
                    logic,
                    true_item,
                    false_item,
                }
            }
            ItemTemplate::Empty { name } => LogicItem::Empty { name: name.clone() },
        };
        Ok(item)
    }

    /// Recover the serialized form of a compiled item
    pub fn from_item(item: &LogicItem, lm: &LogicManager) -> Self {
        let raw = |tv: &TermValue| RawTermValue::new(lm.term_name(tv.term), tv.value);
        match item {
            LogicItem::Bool { name, term } => ItemTemplate::Bool {
                name: name.clone(),
                term: lm.term_name(*term),
            },
            LogicItem::Single { name, effect } => ItemTemplate::Single {
                name: name.clone(),
                effect: raw(effect),
            },
            LogicItem::Multi { name, effects } => ItemTemplate::Multi {
                name: name.clone(),
                effects: effects.iter().map(raw).collect(),
            },
            LogicItem::Capped { name, effects, cap } => ItemTemplate::Capped {
                name: name.clone(),
                effects: effects.iter().map(raw).collect(),
                cap: raw(cap),
            },
            LogicItem::Branched {
                name,
                logic,
                true_item,
                false_item,
            } => ItemTemplate::Branched {
                name: name.clone(),
                logic: lm.to_infix(logic),
                true_item: true_item
                    .as_deref()
                    .map(|item| Box::new(ItemTemplate::from_item(item, lm))),
                false_item: false_item
                    .as_deref()
                    .map(|item| Box::new(ItemTemplate::from_item(item, lm))),
            },
            LogicItem::Empty { name } => ItemTemplate::Empty { name: name.clone() },
        }
    }
}

fn resolve_all(values: &[RawTermValue], lm: &LogicManager) -> RandoResult<Vec<TermValue>> {
    values.iter().map(|value| value.resolve(lm)).collect()
}
