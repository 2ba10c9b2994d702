//! Depth-priority transforms
//!
//! Before comparing candidates the strategy passes each location's raw
//! priority through a transform. The transform sees how deep the item's
//! priority ranks against completed spheres and how deep the location is,
//! so it can push items toward or away from late locations.

use std::fmt;
use std::rc::Rc;

/// Depths available to a transform for one candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthContext {
    /// Depth of the sphere being placed
    pub item_depth: usize,
    /// Completed spheres whose mean item priority is at most the item's
    pub item_priority_depth: usize,
    /// Sphere the location became reachable in
    pub location_depth: usize,
}

/// Adjusts a location priority given depth information
#[derive(Clone)]
pub struct DepthPriorityTransform {
    transform: Rc<dyn Fn(&DepthContext, f32) -> f32>,
}

impl DepthPriorityTransform {
    pub fn new(transform: impl Fn(&DepthContext, f32) -> f32 + 'static) -> Self {
        DepthPriorityTransform {
            transform: Rc::new(transform),
        }
    }

    /// Leaves priorities unchanged
    pub fn identity() -> Self {
        DepthPriorityTransform::new(|_, priority| priority)
    }

    /// Penalizes locations shallower than the item's priority depth by
    /// `factor` per sphere of difference
    pub fn scaled(factor: f32) -> Self {
        DepthPriorityTransform::new(move |ctx, priority| {
            if ctx.location_depth < ctx.item_priority_depth {
                priority + factor * (ctx.item_priority_depth - ctx.location_depth) as f32
            } else {
                priority
            }
        })
    }

    #[inline]
    pub fn apply(&self, ctx: &DepthContext, priority: f32) -> f32 {
        (self.transform)(ctx, priority)
    }
}

impl Default for DepthPriorityTransform {
    fn default() -> Self {
        DepthPriorityTransform::identity()
    }
}

impl fmt::Debug for DepthPriorityTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DepthPriorityTransform")
    }
}
