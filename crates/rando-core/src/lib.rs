//! Rando Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by the logic compiler and the
//! placement search:
//! - Term identities and the sequential term table
//! - The packed logic program alphabet
//! - The progression state interface
//! - Ordered collections (stable priority queue, sorted array list)
//! - Errors

pub mod term;
pub mod program;
pub mod state;
pub mod priority_queue;
pub mod sorted_list;
pub mod error;

pub use term::*;
pub use program::*;
pub use state::*;
pub use priority_queue::*;
pub use sorted_list::*;
pub use error::*;
