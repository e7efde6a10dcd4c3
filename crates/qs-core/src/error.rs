//! Shared error type for configuration problems.
//!
//! Sub-crates keep their own error enums and wrap `CoreError` through a
//! `#[from]` variant where configuration is validated.

use thiserror::Error;

/// Setup-time errors that abort a run before any interval executes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("inconsistent configuration: {0}")]
    InconsistentConfiguration(String),

    #[error("unknown mode `{0}`")]
    UnknownMode(String),
}

/// Shorthand result type for `qs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
