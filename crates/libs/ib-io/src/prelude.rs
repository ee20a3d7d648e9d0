//! Common types and utilities.

/// Process error type.
pub use crate::error::Error;

/// Process result type.
pub type Result<T> = core::result::Result<T, Error>;
