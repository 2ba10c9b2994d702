//! Greedy per-sphere placement
//!
//! Placement pipeline for each item of a sphere:
//! 1. Rank the item's priority against the mean item priority of every
//!    completed sphere (its priority depth)
//! 2. Scan candidate pools oldest first, each in priority order
//! 3. Prefer constraint-satisfying candidates, then the lowest adjusted
//!    priority, then the earliest scanned
//! 4. If only violating candidates exist, run the violated constraints'
//!    failure hooks before accepting
//! 5. Remove the chosen location from its pool
//!
//! The sphere's own locations join the candidates only after its items are
//! placed.

use std::cmp::Ordering;

use tracing::debug;

use rando_core::{ascending_f32, RandoError, RandoResult, SortedArrayList};

use crate::sphere::mean_priority;
use crate::{
    participant_order, Constraint, Couple, DepthContext, DepthPriorityTransform, Participant,
    PlaceableItem, PlaceableLocation, RandoPlacement, Sphere,
};

/// Candidate pools and priority history of one side of a group
#[derive(Debug)]
struct PlacementSide<L> {
    /// One pool per completed sphere, oldest first
    pools: Vec<SortedArrayList<L>>,
    mean_priorities: SortedArrayList<f32>,
}

impl<L> PlacementSide<L> {
    fn new() -> Self {
        PlacementSide {
            pools: Vec::new(),
            mean_priorities: SortedArrayList::new(ascending_f32),
        }
    }

    fn clear(&mut self) {
        self.pools.clear();
        self.mean_priorities.clear();
    }

    fn remaining(&self) -> usize {
        self.pools.iter().map(|pool| pool.len()).sum()
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    pool: usize,
    index: usize,
    adjusted: f32,
    satisfied: bool,
}

/// Placement strategy over items `I` and locations `L`
#[derive(Debug)]
pub struct DefaultPlacementStrategy<I, L> {
    transform: DepthPriorityTransform,
    constraints: Vec<Constraint<I, L>>,
    forward: PlacementSide<L>,
    dual: PlacementSide<L>,
}

impl<I: PlaceableItem, L: PlaceableLocation> DefaultPlacementStrategy<I, L> {
    pub fn new(transform: DepthPriorityTransform) -> Self {
        Self::with_constraints(transform, Vec::new())
    }

    /// Strategy using [`DepthPriorityTransform::scaled`]
    pub fn with_scaling_factor(factor: f32) -> Self {
        Self::new(DepthPriorityTransform::scaled(factor))
    }

    pub fn with_constraints(
        transform: DepthPriorityTransform,
        constraints: Vec<Constraint<I, L>>,
    ) -> Self {
        DefaultPlacementStrategy {
            transform,
            constraints,
            forward: PlacementSide::new(),
            dual: PlacementSide::new(),
        }
    }

    pub fn add_constraint(&mut self, constraint: Constraint<I, L>) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint<I, L>] {
        &self.constraints
    }

    pub fn transform(&self) -> &DepthPriorityTransform {
        &self.transform
    }

    /// Unconsumed candidate locations across all forward pools
    pub fn remaining_locations(&self) -> usize {
        self.forward.remaining()
    }

    /// Completed spheres recorded in the forward priority history; spheres
    /// without items are recorded below every priority
    pub fn recorded_spheres(&self) -> usize {
        self.forward.mean_priorities.len()
    }

    /// Choose and consume the best forward location for `item`
    pub fn select_next(&mut self, depth: usize, group: &str, item: &I) -> RandoResult<L> {
        select_from(
            &mut self.forward,
            &self.constraints,
            &self.transform,
            item,
            depth,
            group,
        )
    }

    /// Place every item of `sphere` in order, then open its locations
    pub fn place_group(&mut self, sphere: Sphere<I, L>) -> RandoResult<Vec<RandoPlacement<I, L>>> {
        let pairs = place_sphere(&mut self.forward, &self.constraints, &self.transform, sphere)?;
        Ok(pairs
            .into_iter()
            .map(|(item, location)| RandoPlacement::new(item, location))
            .collect())
    }

    /// Drop all pools and history for a fresh attempt
    pub fn reset(&mut self) {
        self.forward.clear();
        self.dual.clear();
    }

    /// New strategy with the same transform and constraints and no state
    pub fn duplicate(&self) -> Self {
        Self::with_constraints(self.transform.clone(), self.constraints.clone())
    }
}

impl<C: Couple> DefaultPlacementStrategy<C, C> {
    /// Place a coupled group. `dual_sphere` is `None` for a self-dual
    /// group. On the final sphere every leftover location is paired off.
    pub fn place_coupled_group(
        &mut self,
        sphere: Sphere<C, C>,
        dual_sphere: Option<Sphere<C, C>>,
    ) -> RandoResult<Vec<RandoPlacement<C, C>>> {
        let group = sphere.group_label.clone();
        let depth = sphere.depth;
        let is_final = sphere.is_final;

        let mut placements: Vec<RandoPlacement<C, C>> =
            place_sphere(&mut self.forward, &self.constraints, &self.transform, sphere)?
                .into_iter()
                .map(|(item, location)| RandoPlacement::new(item, location))
                .collect();

        let self_dual = dual_sphere.is_none();
        if let Some(dual_sphere) = dual_sphere {
            let pairs = place_sphere(&mut self.dual, &self.constraints, &self.transform, dual_sphere)?;
            // dual pairs are recorded from the forward point of view
            placements.extend(
                pairs
                    .into_iter()
                    .map(|(item, location)| RandoPlacement::new(location, item)),
            );
        }

        if is_final {
            if self_dual {
                self.reconcile_self_dual(depth, &group, &mut placements)?;
            } else {
                self.reconcile_dual(depth, &group, &mut placements)?;
            }
            debug!(group = %group, placements = placements.len(), "Reconciled coupled group");
        }

        Ok(placements)
    }

    /// Leftover dual locations become items for leftover forward locations
    fn reconcile_dual(
        &mut self,
        depth: usize,
        group: &str,
        placements: &mut Vec<RandoPlacement<C, C>>,
    ) -> RandoResult<()> {
        let forward_left = self.forward.remaining();
        let dual_left = self.dual.remaining();
        if forward_left != dual_left {
            return Err(RandoError::Unbalanced {
                group: group.to_string(),
                leftover: forward_left.abs_diff(dual_left),
            });
        }

        while let Some(item) = take_lowest(&mut self.dual.pools) {
            let location = select_from(
                &mut self.forward,
                &self.constraints,
                &self.transform,
                &item,
                depth,
                group,
            )?;
            placements.push(RandoPlacement::new(item, location));
        }
        self.check_drained(group)
    }

    /// Leftover locations pair off among themselves. The item is taken out
    /// of its pool before selection so it never pairs with itself.
    fn reconcile_self_dual(
        &mut self,
        depth: usize,
        group: &str,
        placements: &mut Vec<RandoPlacement<C, C>>,
    ) -> RandoResult<()> {
        let left = self.forward.remaining();
        if left % 2 != 0 {
            return Err(RandoError::Unbalanced {
                group: group.to_string(),
                leftover: 1,
            });
        }

        while let Some(item) = take_lowest(&mut self.forward.pools) {
            let location = select_from(
                &mut self.forward,
                &self.constraints,
                &self.transform,
                &item,
                depth,
                group,
            )?;
            placements.push(RandoPlacement::new(item, location));
        }
        self.check_drained(group)
    }

    fn check_drained(&self, group: &str) -> RandoResult<()> {
        let leftover = self.forward.remaining();
        if leftover > 0 {
            return Err(RandoError::Unbalanced {
                group: group.to_string(),
                leftover,
            });
        }
        Ok(())
    }
}

/// Place one sphere's items against `side`, then open its locations.
/// Returns `(item, location)` pairs in sphere order.
fn place_sphere<I: Participant, L: Participant>(
    side: &mut PlacementSide<L>,
    constraints: &[Constraint<I, L>],
    transform: &DepthPriorityTransform,
    sphere: Sphere<I, L>,
) -> RandoResult<Vec<(I, L)>> {
    debug!(group = %sphere.group_label, depth = sphere.depth, "Beginning placements");

    let mean = mean_priority(&sphere.items);
    let mut pairs = Vec::with_capacity(sphere.items.len());
    for item in sphere.items {
        let location = select_from(
            side,
            constraints,
            transform,
            &item,
            sphere.depth,
            &sphere.group_label,
        )?;
        pairs.push((item, location));
    }

    // an empty sphere still counts toward every later priority depth
    side.mean_priorities.insert(mean.unwrap_or(f32::NEG_INFINITY));
    debug!(
        group = %sphere.group_label,
        depth = sphere.depth,
        mean_priority = ?mean,
        "Finished placements"
    );

    side.pools.push(SortedArrayList::from_iter_with(
        sphere.locations,
        participant_order::<L>,
    ));
    Ok(pairs)
}

fn select_from<I: Participant, L: Participant>(
    side: &mut PlacementSide<L>,
    constraints: &[Constraint<I, L>],
    transform: &DepthPriorityTransform,
    item: &I,
    depth: usize,
    group: &str,
) -> RandoResult<L> {
    let item_priority_depth = side.mean_priorities.count_le(&item.priority());
    let mut best: Option<Candidate> = None;

    for (pool_index, pool) in side.pools.iter().enumerate() {
        for (index, location) in pool.iter().enumerate() {
            let satisfied = constraints.iter().all(|c| c.is_satisfied(item, location));
            if matches!(best, Some(b) if b.satisfied && !satisfied) {
                continue;
            }

            let ctx = DepthContext {
                item_depth: depth,
                item_priority_depth,
                location_depth: location.sphere(),
            };
            let adjusted = transform.apply(&ctx, location.priority());
            let better = match best {
                None => true,
                Some(b) => (satisfied && !b.satisfied) || adjusted < b.adjusted,
            };
            if better {
                best = Some(Candidate {
                    pool: pool_index,
                    index,
                    adjusted,
                    satisfied,
                });
                // the rest of this pool is ordered after this candidate
                if satisfied {
                    break;
                }
            }
        }
    }

    let exhausted = || RandoError::Exhausted {
        group: group.to_string(),
        item: item.name().to_string(),
    };
    let chosen = best.ok_or_else(exhausted)?;
    let pool = &mut side.pools[chosen.pool];

    if !chosen.satisfied {
        if let Some(location) = pool.get(chosen.index) {
            for constraint in constraints
                .iter()
                .filter(|c| !c.is_satisfied(item, location))
            {
                constraint.on_violated(item, location)?;
            }
        }
    }

    let location = pool.remove_at(chosen.index).ok_or_else(exhausted)?;
    debug!(
        item = item.name(),
        location = location.name(),
        priority = location.priority(),
        location_depth = location.sphere(),
        item_depth = depth,
        priority_depth = item_priority_depth,
        adjusted_priority = chosen.adjusted,
        satisfied = chosen.satisfied,
        "Placed item"
    );
    Ok(location)
}

/// Remove the lowest-ordered participant across all pools
fn take_lowest<P: Participant>(pools: &mut [SortedArrayList<P>]) -> Option<P> {
    let mut lowest: Option<(usize, &P)> = None;
    for (index, pool) in pools.iter().enumerate() {
        if let Some(head) = pool.min() {
            let better = match lowest {
                None => true,
                Some((_, current)) => participant_order(head, current) == Ordering::Less,
            };
            if better {
                lowest = Some((index, head));
            }
        }
    }
    let index = lowest?.0;
    pools[index].try_extract_min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    struct Slot {
        name: String,
        priority: f32,
        sphere: usize,
    }

    impl Participant for Slot {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> f32 {
            self.priority
        }

        fn sphere(&self) -> usize {
            self.sphere
        }
    }

    impl PlaceableItem for Slot {}
    impl PlaceableLocation for Slot {}
    impl Couple for Slot {}

    fn slot(name: &str, priority: f32, sphere: usize) -> Slot {
        Slot {
            name: name.to_string(),
            priority,
            sphere,
        }
    }

    fn names(placements: &[RandoPlacement<Slot, Slot>]) -> Vec<(&str, &str)> {
        placements
            .iter()
            .map(|p| (p.item.name(), p.location.name()))
            .collect()
    }

    fn identity() -> DefaultPlacementStrategy<Slot, Slot> {
        DefaultPlacementStrategy::new(DepthPriorityTransform::identity())
    }

    fn open(strategy: &mut DefaultPlacementStrategy<Slot, Slot>, depth: usize, locations: Vec<Slot>) {
        let sphere = Sphere::new(depth, "Main").with_locations(locations);
        assert!(strategy.place_group(sphere).unwrap().is_empty());
    }

    #[test]
    fn test_lowest_priority_first() {
        let mut strategy = identity();
        open(
            &mut strategy,
            0,
            vec![slot("L1", 0.3, 0), slot("L2", 0.1, 0), slot("L3", 0.2, 0)],
        );
        let sphere = Sphere::new(1, "Main").with_items(vec![slot("A", 0.5, 1), slot("B", 0.5, 1)]);
        let placements = strategy.place_group(sphere).unwrap();
        assert_eq!(names(&placements), vec![("A", "L2"), ("B", "L3")]);
        assert_eq!(strategy.remaining_locations(), 1);
    }

    #[test]
    fn test_placement_is_deterministic() {
        let run = || {
            let mut strategy = identity();
            open(&mut strategy, 0, vec![slot("L1", 0.4, 0), slot("L2", 0.4, 0)]);
            let sphere = Sphere::new(1, "Main")
                .with_items(vec![slot("A", 0.1, 1)])
                .with_locations(vec![slot("L3", 0.0, 1)]);
            let mut placements = strategy.place_group(sphere).unwrap();
            let sphere = Sphere::new(2, "Main").with_items(vec![slot("B", 0.1, 2), slot("C", 0.1, 2)]);
            placements.extend(strategy.place_group(sphere).unwrap());
            placements
        };
        let first = run();
        assert_eq!(
            names(&first),
            vec![("A", "L1"), ("B", "L3"), ("C", "L2")]
        );
        assert_eq!(first, run());
    }

    #[test]
    fn test_ties_favor_oldest_pool() {
        let mut strategy = identity();
        open(&mut strategy, 0, vec![slot("Old", 0.1, 0)]);
        open(&mut strategy, 1, vec![slot("New", 0.1, 1)]);
        let sphere = Sphere::new(2, "Main").with_items(vec![slot("A", 0.5, 2)]);
        assert_eq!(names(&strategy.place_group(sphere).unwrap()), vec![("A", "Old")]);
    }

    #[test]
    fn test_constraints_are_preferred() {
        let mut strategy = identity();
        strategy.add_constraint(Constraint::new(|_: &Slot, l: &Slot| l.name != "L1"));
        open(&mut strategy, 0, vec![slot("L1", 0.1, 0), slot("L2", 0.9, 0)]);
        let sphere = Sphere::new(1, "Main").with_items(vec![slot("A", 0.5, 1)]);
        assert_eq!(names(&strategy.place_group(sphere).unwrap()), vec![("A", "L2")]);
    }

    #[test]
    fn test_violation_runs_hooks_only_when_forced() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut strategy = identity();
        strategy.add_constraint(
            Constraint::new(|i: &Slot, _: &Slot| i.name != "Cursed")
                .with_fail(move |_, _| {
                    counter.set(counter.get() + 1);
                    Ok(())
                })
                .with_label("NoCursed"),
        );
        open(&mut strategy, 0, vec![slot("L1", 0.1, 0), slot("L2", 0.2, 0)]);

        let sphere = Sphere::new(1, "Main").with_items(vec![slot("Fine", 0.5, 1), slot("Cursed", 0.5, 1)]);
        let placements = strategy.place_group(sphere).unwrap();
        assert_eq!(names(&placements), vec![("Fine", "L1"), ("Cursed", "L2")]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failure_hook_can_request_retry() {
        let mut strategy = identity();
        strategy.add_constraint(
            Constraint::new(|_: &Slot, _: &Slot| false).with_fail(|i: &Slot, _: &Slot| {
                Err(RandoError::OutOfLocations {
                    group: "Main".into(),
                    item: i.name.clone(),
                })
            }),
        );
        open(&mut strategy, 0, vec![slot("L1", 0.1, 0)]);
        let sphere = Sphere::new(1, "Main").with_items(vec![slot("A", 0.5, 1)]);
        let err = strategy.place_group(sphere).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_exhaustion_is_fatal() {
        let mut strategy = identity();
        let sphere = Sphere::new(0, "Main").with_items(vec![slot("A", 0.5, 0)]);
        let err = strategy.place_group(sphere).unwrap_err();
        assert_eq!(
            err,
            RandoError::Exhausted {
                group: "Main".into(),
                item: "A".into()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_scaled_transform_uses_priority_depth() {
        let setup = |mut strategy: DefaultPlacementStrategy<Slot, Slot>| {
            open(&mut strategy, 0, vec![slot("S0a", 0.1, 0), slot("S0b", 0.5, 0)]);
            let sphere = Sphere::new(1, "Main")
                .with_items(vec![slot("I1", 0.2, 1)])
                .with_locations(vec![slot("S1", 0.6, 1)]);
            assert_eq!(names(&strategy.place_group(sphere).unwrap()), vec![("I1", "S0a")]);
            let sphere = Sphere::new(2, "Main").with_items(vec![slot("I2", 0.9, 2)]);
            strategy.place_group(sphere).unwrap()
        };

        assert_eq!(names(&setup(identity())), vec![("I2", "S0b")]);
        let scaled = DefaultPlacementStrategy::with_scaling_factor(10.0);
        assert_eq!(names(&setup(scaled)), vec![("I2", "S1")]);
    }

    #[test]
    fn test_empty_spheres_count_toward_priority_depth() {
        let depths = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&depths);
        let mut strategy = DefaultPlacementStrategy::new(DepthPriorityTransform::new(
            move |ctx: &DepthContext, priority| {
                seen.borrow_mut().push(ctx.item_priority_depth);
                priority
            },
        ));

        open(&mut strategy, 0, vec![slot("L1", 0.1, 0)]);
        assert_eq!(strategy.recorded_spheres(), 1);
        let sphere = Sphere::new(1, "Main").with_items(vec![slot("A", 0.5, 1)]);
        strategy.place_group(sphere).unwrap();
        assert_eq!(strategy.recorded_spheres(), 2);
        assert_eq!(*depths.borrow(), vec![1]);

        // an empty dual sphere is recorded on the dual side too
        let mut strategy = identity();
        let forward = Sphere::new(0, "Left").with_locations(vec![slot("A1", 0.1, 0)]);
        let dual = Sphere::new(0, "Right").with_locations(vec![slot("B1", 0.1, 0)]);
        strategy.place_coupled_group(forward, Some(dual)).unwrap();
        assert_eq!(strategy.recorded_spheres(), 1);
        assert_eq!(strategy.dual.mean_priorities.len(), 1);
    }

    #[test]
    fn test_reset_and_duplicate() {
        let mut strategy = identity();
        strategy.add_constraint(Constraint::new(|_: &Slot, _: &Slot| true).with_label("Any"));
        open(&mut strategy, 0, vec![slot("L1", 0.1, 0)]);

        let copy = strategy.duplicate();
        assert_eq!(copy.remaining_locations(), 0);
        assert_eq!(copy.constraints()[0].label(), Some("Any"));

        strategy.reset();
        assert_eq!(strategy.remaining_locations(), 0);
        let sphere = Sphere::new(1, "Main").with_items(vec![slot("A", 0.5, 1)]);
        assert!(matches!(
            strategy.place_group(sphere),
            Err(RandoError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_self_dual_reconciliation_balances() {
        let mut strategy = identity();
        let sphere = Sphere::new(0, "Doors")
            .with_locations(vec![
                slot("T1", 0.1, 0),
                slot("T2", 0.2, 0),
                slot("T3", 0.3, 0),
                slot("T4", 0.4, 0),
            ])
            .finalize();
        let placements = strategy.place_coupled_group(sphere, None).unwrap();
        assert_eq!(names(&placements), vec![("T1", "T2"), ("T3", "T4")]);
        assert!(placements.iter().all(|p| p.item.name != p.location.name));
        assert_eq!(strategy.remaining_locations(), 0);
    }

    #[test]
    fn test_self_dual_reconciliation_rejects_odd_counts() {
        let mut strategy = identity();
        let sphere = Sphere::new(0, "Doors")
            .with_locations(vec![slot("T1", 0.1, 0), slot("T2", 0.2, 0), slot("T3", 0.3, 0)])
            .finalize();
        assert_eq!(
            strategy.place_coupled_group(sphere, None).unwrap_err(),
            RandoError::Unbalanced {
                group: "Doors".into(),
                leftover: 1
            }
        );
    }

    #[test]
    fn test_dual_reconciliation() {
        let mut strategy = identity();
        let forward = Sphere::new(0, "Left")
            .with_locations(vec![slot("A1", 0.1, 0), slot("A2", 0.2, 0)])
            .finalize();
        let dual = Sphere::new(0, "Right").with_locations(vec![slot("B1", 0.3, 0), slot("B2", 0.4, 0)]);
        let placements = strategy.place_coupled_group(forward, Some(dual)).unwrap();
        assert_eq!(names(&placements), vec![("B1", "A1"), ("B2", "A2")]);

        let mut strategy = identity();
        let forward = Sphere::new(0, "Left")
            .with_locations(vec![slot("A1", 0.1, 0)])
            .finalize();
        let dual = Sphere::new(0, "Right").with_locations(vec![slot("B1", 0.3, 0), slot("B2", 0.4, 0)]);
        assert_eq!(
            strategy.place_coupled_group(forward, Some(dual)).unwrap_err(),
            RandoError::Unbalanced {
                group: "Left".into(),
                leftover: 1
            }
        );
    }

    #[test]
    fn test_dual_items_fill_dual_pools() {
        let mut strategy = identity();
        let forward = Sphere::new(0, "Left").with_locations(vec![slot("A1", 0.1, 0)]);
        let dual = Sphere::new(0, "Right").with_locations(vec![slot("B1", 0.1, 0)]);
        assert!(strategy
            .place_coupled_group(forward, Some(dual))
            .unwrap()
            .is_empty());

        let forward = Sphere::new(1, "Left").with_items(vec![slot("B2", 0.5, 1)]);
        let dual = Sphere::new(1, "Right").with_items(vec![slot("A2", 0.5, 1)]);
        let placements = strategy.place_coupled_group(forward, Some(dual)).unwrap();
        // the dual pair (A2 at B1) is reported as B1 at A2
        assert_eq!(names(&placements), vec![("B2", "A1"), ("B1", "A2")]);
    }

    proptest! {
        #[test]
        fn prop_items_take_lowest_locations_in_order(
            priorities in prop::collection::vec(0.0f32..1.0, 1..32),
            take in 0usize..32,
        ) {
            let take = take.min(priorities.len());
            let locations: Vec<Slot> = priorities
                .iter()
                .enumerate()
                .map(|(i, &p)| slot(&format!("L{:02}", i), p, 0))
                .collect();
            let mut expected = locations.clone();
            expected.sort_by(participant_order);

            let mut strategy = identity();
            open(&mut strategy, 0, locations);
            let items = (0..take).map(|i| slot(&format!("I{:02}", i), 0.5, 1)).collect();
            let placements = strategy.place_group(Sphere::new(1, "Main").with_items(items)).unwrap();

            prop_assert_eq!(placements.len(), take);
            for (placement, location) in placements.iter().zip(expected.iter()) {
                prop_assert_eq!(&placement.location, location);
            }
            prop_assert_eq!(strategy.remaining_locations(), priorities.len() - take);
        }
    }
}
