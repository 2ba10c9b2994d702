//! Rando Logic - Logic language compiler and item effects
//!
//! This crate turns authored logic into executable form:
//! - Infix parsing, macros and the token/clause model
//! - The mutable builder and the compiled, immutable manager
//! - Packed program evaluation against progression state
//! - Computed variables and pluggable resolvers
//! - Logic items, item templates and location costs

pub mod token;
pub mod processor;
pub mod variable;
pub mod json;
pub mod def;
pub mod evaluator;
pub mod item;
pub mod template;
pub mod cost;
pub mod builder;
pub mod manager;

pub use token::*;
pub use processor::*;
pub use variable::*;
pub use json::*;
pub use def::*;
pub use item::*;
pub use template::*;
pub use cost::*;
pub use builder::*;
pub use manager::*;
