//! Common types and utilities.

/// Detection error type.
pub use crate::error::Error;

/// Detection result type.
pub type Result<T> = core::result::Result<T, Error>;
