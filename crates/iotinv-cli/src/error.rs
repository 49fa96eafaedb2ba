//! CLI error types.

use rustyline::error::ReadlineError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Inventory error.
    #[error(transparent)]
    Core(#[from] iotinv_core::Error),

    /// Line editor error.
    #[error("readline error: {0}")]
    Readline(#[from] ReadlineError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the session must end.
    pub fn is_fatal(&self) -> bool {
        match self {
            CliError::Core(e) => e.is_fatal(),
            CliError::Readline(_) | CliError::Io(_) => true,
        }
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
