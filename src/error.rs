//! Error types for the persona store
//!
//! One crate-wide error enum covering the four failure categories the
//! store distinguishes: missing entities, integrity violations, malformed
//! stored records, and filesystem faults. Variants carry the offending
//! entity names so callers can present them without re-deriving context.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the persona store
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Lookup Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona required to exist but absent
    #[error("Persona not found: {name}")]
    PersonaNotFound { name: String },

    // ─────────────────────────────────────────────────────────────
    // Integrity Errors
    // ─────────────────────────────────────────────────────────────

    /// Component delete blocked by personas that still reference it
    #[error("Cannot delete component {}: required by personas: {}", .name, .dependents.join(", "))]
    ComponentInUse {
        name: String,
        dependents: Vec<String>,
    },

    /// Persona references a component that does not resolve
    #[error("Persona {persona} depends on non-existent component: {component}")]
    MissingComponent { persona: String, component: String },

    // ─────────────────────────────────────────────────────────────
    // Data Errors
    // ─────────────────────────────────────────────────────────────

    /// Stored record does not parse into the expected shape
    #[error("Malformed entity record: {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Entity name cannot be used as a file stem
    #[error("Invalid entity name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {}", .path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Check if the error is an integrity gate (referential constraint),
    /// as opposed to an environment or data fault
    pub fn is_dependency_violation(&self) -> bool {
        matches!(
            self,
            Error::ComponentInUse { .. } | Error::MissingComponent { .. }
        )
    }

    /// Check if the error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PersonaNotFound { .. })
    }
}
