//! Install job lifecycle management.
//!
//! Owns the installation parameters submitted by the frontend and at most one
//! install process. The [`Installer`] handle is cheap to clone and is shared
//! by every request handler.
//!
//! ```text
//! Idle --start--> Running --exit--> Finished --cancel--> Idle
//!                 Running --cancel--> Idle (output kept for download)
//! ```

pub mod error;
pub mod installer;
pub mod parameters;
pub mod prelude;

pub use installer::{InstallCommand, Installer, JobState, JobStatus};
pub use parameters::InstallParameters;
