//! Common types and utilities.

/// Job error type.
pub use crate::error::Error;

/// Job result type.
pub type Result<T> = core::result::Result<T, Error>;
