//! Sphere Harness - Seeded reachability driver
//!
//! Drives [`DefaultPlacementStrategy`] the way a randomizer would:
//! - Shuffle items with a seeded RNG and rank them into priorities
//! - Grow progression state one item at a time until new locations open,
//!   settling waypoints after every grant
//! - Hand each sphere to the strategy, oldest locations first
//! - Restart with the next seed when a constraint requests a retry

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use rando_core::{PriorityQueue, ProgressionManager, ProgressionState, RandoResult};
use rando_logic::LogicManager;
use rando_place::{
    Constraint, DefaultPlacementStrategy, DepthPriorityTransform, Participant, RandoItem,
    RandoLocation, RandoPlacement, Sphere, TempState,
};

/// Group label used for the single item/location group
pub const MAIN_GROUP: &str = "Main";

/// Harness configuration
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Seed of the first attempt; each retry uses the next seed
    pub seed: u64,
    /// Attempts before a retry signal is reported as failure
    pub max_attempts: usize,
    /// Penalty per sphere for locations shallower than the item's priority
    /// depth; `0.0` leaves priorities unchanged
    pub depth_priority_scaling: f32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            seed: 42,
            max_attempts: 10,
            depth_priority_scaling: 0.5,
        }
    }
}

impl HarnessConfig {
    /// Single attempt, no depth scaling
    pub fn light() -> Self {
        HarnessConfig {
            seed: 42,
            max_attempts: 1,
            depth_priority_scaling: 0.0,
        }
    }

    /// Many attempts with strong depth scaling
    pub fn exhaustive() -> Self {
        HarnessConfig {
            seed: 42,
            max_attempts: 100,
            depth_priority_scaling: 2.0,
        }
    }

    pub fn transform(&self) -> DepthPriorityTransform {
        if self.depth_priority_scaling == 0.0 {
            DepthPriorityTransform::identity()
        } else {
            DepthPriorityTransform::scaled(self.depth_priority_scaling)
        }
    }
}

/// Outcome of a successful run
#[derive(Clone, Debug)]
pub struct HarnessReport {
    /// Seed of the successful attempt
    pub seed: u64,
    pub attempts: usize,
    pub spheres: usize,
    pub placements: Vec<RandoPlacement<RandoItem, RandoLocation>>,
    /// Locations never reached, by name
    pub unreachable: Vec<String>,
    /// Progression after every item was granted
    pub final_state: ProgressionManager,
}

impl HarnessReport {
    /// Location assigned to `item`, if it was placed
    pub fn location_of(&self, item: &str) -> Option<&RandoLocation> {
        self.placements
            .iter()
            .find(|p| p.item.name() == item)
            .map(|p| &p.location)
    }
}

struct Attempt {
    spheres: usize,
    placements: Vec<RandoPlacement<RandoItem, RandoLocation>>,
    unreachable: Vec<String>,
    final_state: ProgressionManager,
}

/// Forward-fill driver over one item/location group
pub struct SphereHarness {
    config: HarnessConfig,
    lm: LogicManager,
    items: Vec<RandoItem>,
    locations: Vec<RandoLocation>,
    initial: ProgressionManager,
    constraints: Vec<Constraint<RandoItem, RandoLocation>>,
}

impl SphereHarness {
    pub fn new(
        config: HarnessConfig,
        lm: LogicManager,
        items: Vec<RandoItem>,
        locations: Vec<RandoLocation>,
    ) -> Self {
        let initial = ProgressionManager::with_terms(lm.terms().len());
        SphereHarness {
            config,
            lm,
            items,
            locations,
            initial,
            constraints: Vec::new(),
        }
    }

    /// Progression the player starts with
    pub fn with_initial_state(mut self, state: ProgressionManager) -> Self {
        self.initial = state;
        self
    }

    pub fn add_constraint(&mut self, constraint: Constraint<RandoItem, RandoLocation>) {
        self.constraints.push(constraint);
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn manager(&self) -> &LogicManager {
        &self.lm
    }

    /// Run attempts until one succeeds, a fatal error occurs, or the
    /// attempt budget is spent
    pub fn run(&self) -> RandoResult<HarnessReport> {
        let mut strategy =
            DefaultPlacementStrategy::with_constraints(self.config.transform(), self.constraints.clone());
        let mut seed = self.config.seed;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.attempt(&mut strategy, seed) {
                Ok(outcome) => {
                    info!(
                        seed,
                        attempts,
                        spheres = outcome.spheres,
                        placements = outcome.placements.len(),
                        unreachable = outcome.unreachable.len(),
                        "Placement succeeded"
                    );
                    return Ok(HarnessReport {
                        seed,
                        attempts,
                        spheres: outcome.spheres,
                        placements: outcome.placements,
                        unreachable: outcome.unreachable,
                        final_state: outcome.final_state,
                    });
                }
                Err(e) if e.is_retryable() && attempts < self.config.max_attempts => {
                    info!(seed, attempts, error = %e, "Placement attempt failed, retrying");
                    strategy.reset();
                    seed = seed.wrapping_add(1);
                }
                Err(e) => {
                    warn!(seed, attempts, error = %e, "Placement failed");
                    return Err(e);
                }
            }
        }
    }

    fn attempt(
        &self,
        strategy: &mut DefaultPlacementStrategy<RandoItem, RandoLocation>,
        seed: u64,
    ) -> RandoResult<Attempt> {
        let mut rng = StdRng::seed_from_u64(seed);

        // random keys give a shuffle that is stable for a fixed seed
        let mut queue = PriorityQueue::from_values(self.items.iter().cloned(), |_| rng.gen::<u64>());
        let total = queue.len().max(1) as f32;
        let mut pending: VecDeque<RandoItem> = queue
            .drain_ordered()
            .enumerate()
            .map(|(rank, (_, mut item))| {
                item.priority = rank as f32 / total;
                item.placed = TempState::None;
                item
            })
            .collect();

        let mut unreached: Vec<RandoLocation> = self
            .locations
            .iter()
            .cloned()
            .map(|mut location| {
                location.priority = rng.gen::<f32>();
                location.reachable = TempState::None;
                location
            })
            .collect();

        let mut state = self.initial.clone();
        let mut placements = Vec::with_capacity(pending.len());
        let mut depth = 0;

        let opened = self.take_reachable(&mut unreached, &mut state, depth);
        let sphere = Sphere::new(depth, MAIN_GROUP).with_locations(opened);
        let sphere = if pending.is_empty() { sphere.finalize() } else { sphere };
        placements.extend(strategy.place_group(sphere)?);

        while !pending.is_empty() {
            depth += 1;
            let mut items = Vec::new();
            let mut opened = Vec::new();
            while opened.is_empty() {
                let Some(mut item) = pending.pop_front() else {
                    break;
                };
                item.sphere = depth;
                item.placed = TempState::Temporary;
                item.add_to(&self.lm, &mut state);
                items.push(item);
                opened = self.take_reachable(&mut unreached, &mut state, depth);
            }

            let sphere = Sphere::new(depth, MAIN_GROUP)
                .with_items(items)
                .with_locations(opened);
            let sphere = if pending.is_empty() { sphere.finalize() } else { sphere };
            placements.extend(strategy.place_group(sphere)?);
        }

        for placement in &mut placements {
            placement.item.placed = TempState::Permanent;
        }
        if !unreached.is_empty() {
            warn!(count = unreached.len(), "Locations left unreachable");
        }

        Ok(Attempt {
            spheres: depth + 1,
            placements,
            unreachable: unreached.iter().map(|l| l.name().to_string()).collect(),
            final_state: state,
        })
    }

    /// Set every waypoint whose logic holds, until nothing changes
    fn settle_waypoints(&self, state: &mut ProgressionManager) {
        loop {
            let ready: Vec<_> = self
                .lm
                .waypoints()
                .filter(|wp| !state.has(wp.term) && wp.can_get(&self.lm, &*state))
                .map(|wp| wp.term)
                .collect();
            if ready.is_empty() {
                break;
            }
            for term in ready {
                state.set(term, 1);
            }
        }
    }

    /// Move every location reachable under `state` out of `unreached`
    fn take_reachable(
        &self,
        unreached: &mut Vec<RandoLocation>,
        state: &mut ProgressionManager,
        depth: usize,
    ) -> Vec<RandoLocation> {
        self.settle_waypoints(state);
        let mut opened = Vec::new();
        let mut i = 0;
        while i < unreached.len() {
            if unreached[i].can_get(&self.lm, &*state) {
                let mut location = unreached.remove(i);
                location.sphere = depth;
                location.reachable = TempState::Permanent;
                opened.push(location);
            } else {
                i += 1;
            }
        }
        opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{key_chain, key_door};
    use rando_core::RandoError;
    use std::cell::Cell;
    use std::rc::Rc;

    fn assert_forward_fill(report: &HarnessReport) {
        for placement in &report.placements {
            assert!(
                placement.location.sphere < placement.item.sphere,
                "{} placed at {} in sphere {}",
                placement.item.name(),
                placement.location.name(),
                placement.location.sphere
            );
            assert_eq!(placement.item.placed, TempState::Permanent);
        }
    }

    #[test]
    fn test_key_chain_places_every_item() {
        let world = key_chain(6).unwrap();
        let harness = SphereHarness::new(HarnessConfig::default(), world.lm, world.items, world.locations);
        let report = harness.run().unwrap();

        assert_eq!(report.attempts, 1);
        assert_eq!(report.placements.len(), 6);
        assert_eq!(report.spheres, 7);
        assert!(report.unreachable.is_empty());
        assert_forward_fill(&report);
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = |seed| {
            let world = key_door().unwrap();
            let config = HarnessConfig {
                seed,
                ..HarnessConfig::default()
            };
            let report = SphereHarness::new(config, world.lm, world.items, world.locations)
                .run()
                .unwrap();
            report
                .placements
                .iter()
                .map(|p| (p.item.name().to_string(), p.location.name().to_string()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_key_door_respects_logic() {
        let world = key_door().unwrap();
        let keys = world.lm.get_term("Keys").unwrap();
        let report = SphereHarness::new(HarnessConfig::light(), world.lm, world.items, world.locations)
            .run()
            .unwrap();

        assert_forward_fill(&report);
        assert_eq!(report.final_state.get(keys), 3);
        assert_eq!(report.unreachable, vec!["Vault".to_string()]);
    }

    #[test]
    fn test_retry_uses_next_seed() {
        let world = key_chain(3).unwrap();
        let failures = Rc::new(Cell::new(0));
        let counter = Rc::clone(&failures);

        let mut harness = SphereHarness::new(HarnessConfig::default(), world.lm, world.items, world.locations);
        harness.add_constraint(Constraint::new(|_: &RandoItem, _: &RandoLocation| false).with_fail(
            move |item: &RandoItem, _: &RandoLocation| {
                counter.set(counter.get() + 1);
                if counter.get() <= 2 {
                    Err(RandoError::OutOfLocations {
                        group: MAIN_GROUP.into(),
                        item: item.name().to_string(),
                    })
                } else {
                    Ok(())
                }
            },
        ));

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let report = tracing::subscriber::with_default(subscriber, || harness.run()).unwrap();
        assert_eq!(report.attempts, 3);
        assert_eq!(report.seed, 44);
    }

    #[test]
    fn test_retry_budget_is_bounded() {
        let world = key_chain(2).unwrap();
        let mut harness = SphereHarness::new(HarnessConfig::light(), world.lm, world.items, world.locations);
        harness.add_constraint(Constraint::new(|_: &RandoItem, _: &RandoLocation| false).with_fail(
            |item: &RandoItem, _: &RandoLocation| {
                Err(RandoError::OutOfLocations {
                    group: MAIN_GROUP.into(),
                    item: item.name().to_string(),
                })
            },
        ));
        assert!(harness.run().unwrap_err().is_retryable());
    }

    #[test]
    fn test_fatal_errors_abort() {
        // three keys but only the start location
        let world = key_chain(3).unwrap();
        let start: Vec<RandoLocation> = world
            .locations
            .into_iter()
            .filter(|l| l.name() == "Start")
            .collect();
        let harness = SphereHarness::new(HarnessConfig::default(), world.lm, world.items, start);
        assert!(matches!(harness.run(), Err(RandoError::Exhausted { .. })));
    }
}
