//! Unified error types for the feedr workspace
//!
//! Conversion is deliberately forgiving: per-row and per-object problems are
//! collected as [`crate::diagnostics`] issues and never surface here. A
//! [`FeedrError`] is reserved for the cases where no partial output makes
//! sense (input that is not a table at all, an unreadable config file).
//!
//! # Example
//!
//! ```
//! use feedr_core::{FeedrError, FeedrResult};
//!
//! fn first_row(text: &str) -> FeedrResult<&str> {
//!     text.lines()
//!         .find(|line| !line.trim().is_empty())
//!         .ok_or_else(|| FeedrError::Structure("empty table".into()))
//! }
//!
//! assert!(first_row("\n\n").is_err());
//! ```

use thiserror::Error;

/// Unified error type for all feedr operations.
#[derive(Error, Debug)]
pub enum FeedrError {
    /// A row the table reader could not split
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input text is empty or not tabular
    #[error("Structure error: {0}")]
    Structure(String),

    /// Unreadable or malformed configuration file
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using FeedrError.
pub type FeedrResult<T> = Result<T, FeedrError>;
