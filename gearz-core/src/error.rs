//! Error types for the GEARZ core library.
//!
//! Disqualification is never an error: the scoring pipeline reports it
//! through sentinel values. These variants cover data the engine could not
//! resolve and misuse at the configuration / persistence boundary.

use thiserror::Error;

use crate::types::{DefinitionId, MaterialId};

/// Top-level error type for all GEARZ operations.
#[derive(Error, Debug)]
pub enum GearzError {
    /// The catalog has no definition with this id.
    #[error("Unknown item definition: {0}")]
    UnknownDefinition(DefinitionId),

    /// The catalog has no material variant with this id.
    #[error("Unknown material variant: {0}")]
    UnknownMaterial(MaterialId),

    /// Item data produced a value the rule tables cannot use.
    #[error("Invalid item data for {definition}: {reason}")]
    InvalidItemData {
        /// Definition the bad value came from.
        definition: DefinitionId,
        /// What was wrong with it.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A scheduled-event handler failed during dispatch.
    #[error("Event handler for {kind} failed at tick {tick}: {reason}")]
    Handler {
        /// Kind of the event being dispatched.
        kind: crate::scheduler::EventKind,
        /// Tick being processed.
        tick: u64,
        /// Handler-supplied reason.
        reason: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GearzError>;
