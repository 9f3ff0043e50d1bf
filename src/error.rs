//! Error types for the importgate crate.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for importgate operations.
///
/// A `Store` error is a third outcome, distinct from both an allowed and a
/// denied check: the calling layer must map it to an internal failure and
/// never treat it as an implicit allow.
#[derive(Error, Debug)]
pub enum ImportGateError {
    /// Configuration-related errors (zero limits, empty prefixes, unparseable files)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The shared window store was unreachable or its atomic operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for importgate operations.
pub type Result<T> = std::result::Result<T, ImportGateError>;
