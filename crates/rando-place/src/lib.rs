//! Rando Place - Greedy sphere-based placement search
//!
//! This crate assigns items to locations one reachability sphere at a time:
//! - Participants (items, locations, coupled transitions)
//! - Sphere input and placement output
//! - Soft constraints with failure hooks
//! - Depth-priority transforms
//! - The default placement strategy and coupled-group reconciliation

pub mod participant;
pub mod sphere;
pub mod constraint;
pub mod transform;
pub mod strategy;

pub use participant::*;
pub use sphere::*;
pub use constraint::*;
pub use transform::*;
pub use strategy::*;
