//! Error types for the arena simulation.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Why the registry refused an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionReason {
    /// Another live entity already carries the name.
    DuplicateName,
    /// Empty, or contains whitespace; the record format could not hold it.
    InvalidName,
    /// Position lies outside `[0, width] x [0, height]`.
    OutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionReason::DuplicateName => f.write_str("name already in use"),
            AdmissionReason::InvalidName => {
                f.write_str("name must be non-empty and free of whitespace")
            }
            AdmissionReason::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "position ({x}, {y}) outside 0..{width} x 0..{height}"
            ),
        }
    }
}

/// Top-level error type for the simulation library.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Entity refused by the registry; nothing was mutated.
    #[error("Entity '{name}' rejected: {reason}")]
    AdmissionRejected {
        /// Name of the rejected entity.
        name: String,
        /// Which admission rule failed.
        reason: AdmissionReason,
    },

    /// Malformed line in a persisted roster.
    #[error("Bad NPC record on line {line}: {message}")]
    Format {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Archetype token that names no known archetype.
    #[error("Unknown NPC type: {0}")]
    UnknownArchetype(String),

    /// Configuration values that cannot drive a simulation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ArenaError {
    pub fn rejected(name: impl Into<String>, reason: AdmissionReason) -> Self {
        ArenaError::AdmissionRejected {
            name: name.into(),
            reason,
        }
    }
}
