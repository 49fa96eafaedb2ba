//! Core error types.

use thiserror::Error;

use crate::catalog::EntityKind;

/// Core inventory errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying SQLite error.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Cascade delete failed part-way.
    #[error("cascade error: {0}")]
    Cascade(#[from] CascadeError),

    /// A record references a parent row that does not exist.
    #[error("{entity} references missing {parent} #{id}")]
    MissingParent {
        entity: EntityKind,
        parent: EntityKind,
        id: i64,
    },

    /// Record not found.
    #[error("{entity} #{id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    /// The entity kind has no surrogate id.
    #[error("{0} has no surrogate id")]
    NotKeyed(EntityKind),

    /// Raw queries are disabled for this store.
    #[error("raw queries are disabled (open the store with raw SQL enabled)")]
    CapabilityDenied,

    /// A raw query tried to modify the database.
    #[error("only read-only statements are accepted")]
    ReadOnlyViolation,

    /// A raw query failed to prepare or run.
    #[error("query error: {0}")]
    Query(String),

    /// Invalid configuration or schema state.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error should end the interactive session.
    ///
    /// Only store-level failures are fatal; everything else is the result of
    /// user input and can be reported in place.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Cascade(_))
    }
}

/// Cascade delete errors.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// A step of the delete plan failed; the enclosing transaction was dropped.
    #[error("step {step} of {entity} #{id} failed while removing {child}: {source}")]
    StepFailed {
        entity: EntityKind,
        id: i64,
        step: usize,
        child: EntityKind,
        #[source]
        source: rusqlite::Error,
    },

    /// Removing the target row itself failed.
    #[error("failed to remove {entity} #{id}: {source}")]
    TargetFailed {
        entity: EntityKind,
        id: i64,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
