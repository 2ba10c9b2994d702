//! Raw ingestion records
//!
//! These are the uncompiled shapes read from JSON documents: logic is still
//! infix text and names are not yet term ids.

use serde::{Deserialize, Serialize};

/// Document kinds accepted by [`LogicManagerBuilder::deserialize_json`]
///
/// [`LogicManagerBuilder::deserialize_json`]: crate::LogicManagerBuilder::deserialize_json
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonType {
    /// `["Term", ...]`
    Terms,
    /// `[{ "name", "logic" }, ...]`; each name also becomes a term
    Waypoints,
    /// `[{ "name"?, "scene", "gate", "logic", "oneWayFlag"? }, ...]`
    Transitions,
    /// `{ "NAME": "logic", ... }`
    Macros,
    /// `[{ "type": ..., "name": ..., ... }, ...]`
    Items,
    /// `[{ "name", "logic" }, ...]`
    Locations,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Terms => "terms",
            JsonType::Waypoints => "waypoints",
            JsonType::Transitions => "transitions",
            JsonType::Macros => "macros",
            JsonType::Items => "items",
            JsonType::Locations => "locations",
        }
    }
}

/// A named infix logic string
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawLogicDef {
    pub name: String,
    pub logic: String,
}

impl RawLogicDef {
    pub fn new(name: impl Into<String>, logic: impl Into<String>) -> Self {
        RawLogicDef {
            name: name.into(),
            logic: logic.into(),
        }
    }
}

/// Traversal direction of a transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OneWayType {
    #[default]
    TwoWay,
    OneWayIn,
    OneWayOut,
}

/// A scene gate with its infix logic
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogicTransition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub scene: String,
    pub gate: String,
    pub logic: String,
    #[serde(default, rename = "oneWayFlag")]
    pub one_way: OneWayType,
}

impl RawLogicTransition {
    pub fn new(
        scene: impl Into<String>,
        gate: impl Into<String>,
        logic: impl Into<String>,
        one_way: OneWayType,
    ) -> Self {
        RawLogicTransition {
            name: String::new(),
            scene: scene.into(),
            gate: gate.into(),
            logic: logic.into(),
            one_way,
        }
    }

    /// Explicit name, or `scene[gate]`
    pub fn full_name(&self) -> String {
        if self.name.is_empty() {
            format!("{}[{}]", self.scene, self.gate)
        } else {
            self.name.clone()
        }
    }
}
