//! Error types for the rando engine

use thiserror::Error;

/// Core rando errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RandoError {
    // Compile errors
    #[error("Malformed logic for {name}: {message}")]
    Parse { name: String, message: String },

    #[error("Unable to resolve {name} in logic for {definition}")]
    UnresolvedName { definition: String, name: String },

    #[error("Unknown term: {0}")]
    UnknownTerm(String),

    #[error("Unknown macro: {0}")]
    UnknownMacro(String),

    #[error("Unknown reference *{target} in logic for {definition}")]
    UnknownReference { definition: String, target: String },

    #[error("Circular reference through {0}")]
    CircularReference(String),

    #[error("Invalid {context} json: {message}")]
    Json { context: String, message: String },

    #[error("Malformed program for {name} at symbol {position}")]
    MalformedProgram { name: String, position: usize },

    // Lookup errors
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Unknown logic definition: {0}")]
    UnknownLogicDef(String),

    // Item errors
    #[error("Item {0} has no exact inverse")]
    NotRemovable(String),

    // Collection errors
    #[error("Priority queue empty")]
    EmptyQueue,

    // Placement errors
    #[error("Out of locations for {item} in group {group}")]
    OutOfLocations { group: String, item: String },

    #[error("No locations left for {item} in group {group}")]
    Exhausted { group: String, item: String },

    #[error("Group {group} has {leftover} locations left over after reconciliation")]
    Unbalanced { group: String, leftover: usize },

    #[error("Constraint {label} rejected {item} at {location}")]
    ConstraintViolation {
        label: String,
        item: String,
        location: String,
    },
}

impl RandoError {
    /// Whether the attempt can be restarted with fresh randomness
    pub fn is_retryable(&self) -> bool {
        matches!(self, RandoError::OutOfLocations { .. })
    }
}

/// Result type for rando operations
pub type RandoResult<T> = Result<T, RandoError>;
