//! Shared error classification.
//!
//! Every error enum in the crate maps to a stable machine-readable code so
//! the shell (and any future transport) can report failures uniformly.

/// Stable error code plus retry hint for an error type.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
