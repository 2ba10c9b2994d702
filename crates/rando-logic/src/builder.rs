//! Mutable accumulation of terms, logic and items
//!
//! The builder holds raw, name-keyed material: a growing term table, parsed
//! but uncompiled clauses, and item templates. Infix text is parsed eagerly
//! so malformed logic fails at ingestion; name resolution waits for
//! [`LogicManager::new`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use rando_core::{RandoError, RandoResult, TermId, TermTable};

use crate::{
    DefaultVariableResolver, ItemTemplate, JsonType, LogicClause, LogicItem, LogicManager,
    LogicProcessor, RawLogicDef, RawLogicTransition, VariableResolver,
};

/// Name-keyed, uncompiled logic material
#[derive(Clone, Debug)]
pub struct LogicManagerBuilder {
    terms: TermTable,
    pub processor: LogicProcessor,
    pub variable_resolver: Arc<dyn VariableResolver>,
    /// Compiled items; these replace templates of the same name
    pub prefab_items: BTreeMap<String, LogicItem>,
    pub item_templates: BTreeMap<String, ItemTemplate>,
    /// Every named clause: waypoints, transitions and locations
    pub logic_lookup: BTreeMap<String, LogicClause>,
    pub waypoints: BTreeMap<String, RawLogicDef>,
    pub transitions: BTreeMap<String, RawLogicTransition>,
}

impl Default for LogicManagerBuilder {
    fn default() -> Self {
        LogicManagerBuilder {
            terms: TermTable::new(),
            processor: LogicProcessor::new(),
            variable_resolver: Arc::new(DefaultVariableResolver::new()),
            prefab_items: BTreeMap::new(),
            item_templates: BTreeMap::new(),
            logic_lookup: BTreeMap::new(),
            waypoints: BTreeMap::new(),
            transitions: BTreeMap::new(),
        }
    }
}

impl LogicManagerBuilder {
    pub fn new() -> Self {
        LogicManagerBuilder::default()
    }

    /// Reopen a compiled manager for editing. Logic is recovered as infix
    /// text through the delinearizer and items as templates, so the next
    /// build allocates variables afresh.
    pub fn from_manager(lm: &LogicManager) -> Self {
        let logic_lookup = lm
            .logic_defs()
            .map(|def| (def.name().to_string(), lm.to_clause(def)))
            .collect();
        let waypoints = lm
            .waypoints()
            .map(|w| {
                let name = w.name().to_string();
                (name.clone(), RawLogicDef::new(name, lm.to_infix(&w.logic)))
            })
            .collect();
        let transitions = lm
            .transitions()
            .map(|t| {
                let mut raw = RawLogicTransition::new(
                    t.scene.clone(),
                    t.gate.clone(),
                    lm.to_infix(&t.logic),
                    t.one_way,
                );
                raw.name = t.name.clone();
                (t.name.clone(), raw)
            })
            .collect();
        let item_templates = lm
            .items()
            .map(|item| (item.name().to_string(), ItemTemplate::from_item(item, lm)))
            .collect();

        LogicManagerBuilder {
            terms: lm.terms().clone(),
            processor: lm.processor().clone(),
            variable_resolver: lm.variable_resolver().clone(),
            prefab_items: BTreeMap::new(),
            item_templates,
            logic_lookup,
            waypoints,
            transitions,
        }
    }

    /// Existing id for `name`, or the next sequential one
    pub fn get_or_add_term(&mut self, name: &str) -> TermId {
        self.terms.get_or_add(name)
    }

    pub fn get_term(&self, name: &str) -> Option<TermId> {
        self.terms.id_of(name)
    }

    pub fn terms(&self) -> &TermTable {
        &self.terms
    }

    pub fn add_item(&mut self, item: LogicItem) {
        self.prefab_items.insert(item.name().to_string(), item);
    }

    pub fn add_template(&mut self, template: ItemTemplate) {
        self.item_templates
            .insert(template.name().to_string(), template);
    }

    /// Parse and record location logic
    pub fn add_logic_def(&mut self, def: RawLogicDef) -> RandoResult<()> {
        let clause = self.processor.parse_infix(&def.name, &def.logic)?;
        self.logic_lookup.insert(def.name, clause);
        Ok(())
    }

    /// Record waypoint logic; the waypoint name becomes a term
    pub fn add_waypoint(&mut self, def: RawLogicDef) -> RandoResult<()> {
        let clause = self.processor.parse_infix(&def.name, &def.logic)?;
        self.get_or_add_term(&def.name);
        self.logic_lookup.insert(def.name.clone(), clause);
        self.waypoints.insert(def.name.clone(), def);
        Ok(())
    }

    /// Record transition logic; the transition name becomes a term
    pub fn add_transition(&mut self, mut def: RawLogicTransition) -> RandoResult<()> {
        let name = def.full_name();
        let clause = self.processor.parse_infix(&name, &def.logic)?;
        self.get_or_add_term(&name);
        self.logic_lookup.insert(name.clone(), clause);
        def.name = name.clone();
        self.transitions.insert(name, def);
        Ok(())
    }

    /// Ingest one JSON document of the given kind
    pub fn deserialize_json(&mut self, kind: JsonType, json: &str) -> RandoResult<()> {
        let value: Value = serde_json::from_str(json).map_err(|e| json_error(kind, e))?;
        self.deserialize_value(kind, value)
    }

    /// Ingest an already-parsed JSON value of the given kind
    pub fn deserialize_value(&mut self, kind: JsonType, value: Value) -> RandoResult<()> {
        match kind {
            JsonType::Terms => {
                for term in decode::<Vec<String>>(kind, value)? {
                    self.get_or_add_term(&term);
                }
            }
            JsonType::Waypoints => {
                for def in decode::<Vec<RawLogicDef>>(kind, value)? {
                    self.add_waypoint(def)?;
                }
            }
            JsonType::Transitions => {
                for def in decode::<Vec<RawLogicTransition>>(kind, value)? {
                    self.add_transition(def)?;
                }
            }
            JsonType::Macros => {
                let macros = decode::<BTreeMap<String, String>>(kind, value)?;
                self.processor
                    .set_macros(macros.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
            }
            JsonType::Items => {
                for template in decode::<Vec<ItemTemplate>>(kind, value)? {
                    self.add_template(template);
                }
            }
            JsonType::Locations => {
                for def in decode::<Vec<RawLogicDef>>(kind, value)? {
                    self.add_logic_def(def)?;
                }
            }
        }
        Ok(())
    }

    /// Compile into an immutable manager
    pub fn build(&self) -> RandoResult<LogicManager> {
        LogicManager::new(self)
    }
}

fn decode<T: DeserializeOwned>(kind: JsonType, value: Value) -> RandoResult<T> {
    serde_json::from_value(value).map_err(|e| json_error(kind, e))
}

fn json_error(kind: JsonType, error: serde_json::Error) -> RandoError {
    RandoError::Json {
        context: kind.as_str().to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OneWayType;

    #[test]
    fn test_get_or_add_term_is_idempotent() {
        let mut lmb = LogicManagerBuilder::new();
        let a = lmb.get_or_add_term("A");
        let b = lmb.get_or_add_term("B");
        assert_eq!(lmb.get_or_add_term("A"), a);
        assert_eq!((a.0, b.0), (0, 1));
        assert_eq!(lmb.terms().len(), 2);
    }

    #[test]
    fn test_ingest_every_kind() {
        let mut lmb = LogicManagerBuilder::new();
        lmb.deserialize_json(JsonType::Terms, r#"["Dash", "Claw", "Keys"]"#)
            .unwrap();
        lmb.deserialize_json(JsonType::Macros, r#"{ "MOBILE": "Dash | Claw" }"#)
            .unwrap();
        lmb.deserialize_json(
            JsonType::Waypoints,
            r#"[{ "name": "Hub", "logic": "MOBILE" }]"#,
        )
        .unwrap();
        lmb.deserialize_json(
            JsonType::Transitions,
            r#"[{ "scene": "Town", "gate": "left1", "logic": "*Hub", "oneWayFlag": "OneWayOut" }]"#,
        )
        .unwrap();
        lmb.deserialize_json(
            JsonType::Locations,
            r#"[{ "name": "Chest", "logic": "Town[left1] + Keys>1" }]"#,
        )
        .unwrap();
        lmb.deserialize_json(
            JsonType::Items,
            r#"[{ "type": "Single", "name": "Key", "effect": { "term": "Keys", "value": 1 } }]"#,
        )
        .unwrap();

        assert!(lmb.get_term("Hub").is_some());
        assert!(lmb.get_term("Town[left1]").is_some());
        assert_eq!(lmb.transitions["Town[left1]"].one_way, OneWayType::OneWayOut);
        assert_eq!(lmb.logic_lookup.len(), 3);
        assert!(lmb.item_templates.contains_key("Key"));
    }

    #[test]
    fn test_later_ingestion_overwrites() {
        let mut lmb = LogicManagerBuilder::new();
        lmb.add_logic_def(RawLogicDef::new("Chest", "A")).unwrap();
        lmb.add_logic_def(RawLogicDef::new("Chest", "B + C")).unwrap();
        assert_eq!(lmb.logic_lookup["Chest"].to_infix(), "B + C");
    }

    #[test]
    fn test_ingestion_errors() {
        let mut lmb = LogicManagerBuilder::new();
        let err = lmb
            .deserialize_json(JsonType::Locations, r#"[{ "name": "Chest", "logic": "A +" }]"#)
            .unwrap_err();
        assert!(matches!(err, RandoError::Parse { ref name, .. } if name == "Chest"));

        let err = lmb
            .deserialize_json(JsonType::Terms, r#"{ "not": "a list" }"#)
            .unwrap_err();
        assert!(matches!(err, RandoError::Json { ref context, .. } if context == "terms"));

        let err = lmb.deserialize_json(JsonType::Items, "[").unwrap_err();
        assert!(matches!(err, RandoError::Json { ref context, .. } if context == "items"));
    }
}
