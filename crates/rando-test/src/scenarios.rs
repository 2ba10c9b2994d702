//! Scenario worlds
//!
//! Small, fully specified worlds for the harness, tests and benches. Each
//! world carries its compiled manager plus ready-to-place items and
//! locations.

use serde_json::json;

use rando_core::{RandoError, RandoResult, TermValue};
use rando_logic::{JsonType, LogicItem, LogicManager, LogicManagerBuilder, RawLogicDef};
use rando_place::{RandoItem, RandoLocation, RandoTransition};

/// A compiled world ready for placement
#[derive(Clone, Debug)]
pub struct World {
    pub lm: LogicManager,
    pub items: Vec<RandoItem>,
    pub locations: Vec<RandoLocation>,
}

impl World {
    /// Wrap every named item and location of `lm`
    pub fn from_manager(lm: LogicManager, items: &[&str], locations: &[&str]) -> RandoResult<Self> {
        let items = items
            .iter()
            .map(|name| {
                lm.get_item(name)
                    .cloned()
                    .map(RandoItem::new)
                    .ok_or_else(|| RandoError::UnknownItem(name.to_string()))
            })
            .collect::<RandoResult<Vec<_>>>()?;
        let locations = locations
            .iter()
            .map(|name| {
                lm.get_logic_def(name)
                    .cloned()
                    .map(RandoLocation::new)
                    .ok_or_else(|| RandoError::UnknownLogicDef(name.to_string()))
            })
            .collect::<RandoResult<Vec<_>>>()?;
        Ok(World { lm, items, locations })
    }
}

/// `Start` is free; `Loc{i}` needs `Key{i}`. Every key is a Bool item.
pub fn key_chain(n: usize) -> RandoResult<World> {
    let mut lmb = LogicManagerBuilder::new();
    lmb.add_logic_def(RawLogicDef::new("Start", "TRUE"))?;

    let mut item_names = Vec::with_capacity(n);
    let mut location_names = vec!["Start".to_string()];
    for i in 1..=n {
        let key = format!("Key{}", i);
        let term = lmb.get_or_add_term(&key);
        lmb.add_item(LogicItem::Bool {
            name: key.clone(),
            term,
        });
        let location = format!("Loc{}", i);
        lmb.add_logic_def(RawLogicDef::new(location.as_str(), key.as_str()))?;
        item_names.push(key);
        location_names.push(location);
    }

    let lm = lmb.build()?;
    let items: Vec<&str> = item_names.iter().map(String::as_str).collect();
    let locations: Vec<&str> = location_names.iter().map(String::as_str).collect();
    World::from_manager(lm, &items, &locations)
}

/// Three counted keys, two free locations, doors at one and two keys, and
/// a vault needing more keys than exist
pub fn key_door() -> RandoResult<World> {
    let mut lmb = LogicManagerBuilder::new();
    let keys = lmb.get_or_add_term("Keys");
    for i in 1..=3 {
        lmb.add_item(LogicItem::Single {
            name: format!("Key{}", i),
            effect: TermValue::new(keys, 1),
        });
    }
    for (name, logic) in [
        ("Start1", "TRUE"),
        ("Start2", "ANY"),
        ("Door1", "Keys>0"),
        ("Door2", "Keys>1"),
        ("Vault", "Keys>3"),
    ] {
        lmb.add_logic_def(RawLogicDef::new(name, logic))?;
    }

    let lm = lmb.build()?;
    World::from_manager(
        lm,
        &["Key1", "Key2", "Key3"],
        &["Start1", "Start2", "Door1", "Door2", "Vault"],
    )
}

/// A small world read entirely from JSON documents: macros, waypoints,
/// item templates and locations referencing each other
pub fn json_world() -> RandoResult<World> {
    let mut lmb = LogicManagerBuilder::new();
    lmb.deserialize_value(JsonType::Terms, json!(["Dash", "Claw", "Geo"]))?;
    lmb.deserialize_value(
        JsonType::Macros,
        json!({ "MOBILITY": "Dash | Claw", "RICH": "Geo>99" }),
    )?;
    lmb.deserialize_value(
        JsonType::Waypoints,
        json!([{ "name": "Upper_Ledge", "logic": "MOBILITY" }]),
    )?;
    lmb.deserialize_value(
        JsonType::Items,
        json!([
            { "type": "Bool", "name": "Mothwing_Cloak", "term": "Dash" },
            { "type": "Bool", "name": "Mantis_Claw", "term": "Claw" },
            { "type": "Single", "name": "Geo_Chest", "effect": { "term": "Geo", "value": 100 } },
            { "type": "Empty", "name": "Nothing" }
        ]),
    )?;
    lmb.deserialize_value(
        JsonType::Locations,
        json!([
            { "name": "King's_Pass", "logic": "TRUE" },
            { "name": "Crossroads", "logic": "ANY" },
            { "name": "Dirtmouth", "logic": "TRUE" },
            { "name": "Fountain", "logic": "TRUE" },
            { "name": "Ledge_Chest", "logic": "Upper_Ledge" },
            { "name": "Shop", "logic": "*Ledge_Chest + RICH" },
            { "name": "Summit", "logic": "Dash + Claw" }
        ]),
    )?;

    let lm = lmb.build()?;
    World::from_manager(
        lm,
        &["Mothwing_Cloak", "Mantis_Claw", "Geo_Chest", "Nothing"],
        &[
            "King's_Pass",
            "Crossroads",
            "Dirtmouth",
            "Fountain",
            "Ledge_Chest",
            "Shop",
            "Summit",
        ],
    )
}

/// Compiled transitions ready for coupled placement
#[derive(Clone, Debug)]
pub struct TransitionWorld {
    pub lm: LogicManager,
    /// In name order, with priorities rising by 0.1
    pub transitions: Vec<RandoTransition>,
}

/// Two scenes with two gates each, read from a Transitions document. The
/// cave gates need a lantern.
pub fn transition_world() -> RandoResult<TransitionWorld> {
    let mut lmb = LogicManagerBuilder::new();
    lmb.deserialize_value(JsonType::Terms, json!(["Lantern"]))?;
    lmb.deserialize_value(
        JsonType::Transitions,
        json!([
            { "scene": "Town", "gate": "left1", "logic": "TRUE" },
            { "scene": "Town", "gate": "right1", "logic": "TRUE" },
            { "scene": "Cave", "gate": "left1", "logic": "Lantern" },
            { "scene": "Cave", "gate": "right1", "logic": "Lantern", "oneWayFlag": "OneWayOut" }
        ]),
    )?;

    let lm = lmb.build()?;
    let transitions = lm
        .transitions()
        .cloned()
        .enumerate()
        .map(|(i, transition)| {
            let mut rt = RandoTransition::new(transition);
            rt.priority = i as f32 * 0.1;
            rt
        })
        .collect();
    Ok(TransitionWorld { lm, transitions })
}
