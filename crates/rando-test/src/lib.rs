//! Rando Test Harness - Reachability driver and end-to-end validation
//!
//! This crate provides:
//! - A seeded sphere-by-sphere reachability driver with retry handling
//! - Scenario worlds built in code and from JSON documents
//! - End-to-end placement checks

pub mod harness;
pub mod scenarios;

pub use harness::*;
pub use scenarios::*;
