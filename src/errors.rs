//! Error types for icc-core
//!
//! Most conditions this crate encounters are recoverable (see
//! [`crate::diagnostics`]) and never become an `Err`. `IccError` exists only
//! for the single fatal condition named by the specification: a bridge-name
//! collision where the existing bridge has an incompatible signature.

use thiserror::Error;

/// Fatal errors that abort analysis of the current input.
#[derive(Debug, Error)]
pub enum IccError {
    /// Two patchers (or two runs of the same patcher) derived the same
    /// bridge method name but disagree on its signature. Bridge naming is
    /// supposed to be deterministic by `(class, kind)`, so this can only
    /// happen if a caller mutated the patch container class out of band.
    #[error("bridge name collision on `{bridge}`: existing signature `{existing}` conflicts with `{attempted}`")]
    InternalInvariantViolation {
        bridge: String,
        existing: String,
        attempted: String,
    },
}

/// Result type alias for icc-core operations.
pub type Result<T> = std::result::Result<T, IccError>;
