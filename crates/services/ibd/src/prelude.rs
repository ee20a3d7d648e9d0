//! Common types and utilities.

/// Service error type.
pub use crate::error::Error;

/// Service result type.
pub type Result<T> = core::result::Result<T, Error>;
