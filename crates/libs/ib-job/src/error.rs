//! Job lifecycle errors.

/// Errors returned by [`crate::Installer`] operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A job is running; poll its status or wait for it to finish.
    #[error("An install job is already running")]
    AlreadyRunning,

    /// No job was started, or the last one was cleared.
    #[error("No install job")]
    NoJob,

    /// The install command could not be launched. No job was created.
    #[error(transparent)]
    Spawn(ib_io::error::Error),

    /// The running process could not be terminated. The job keeps running.
    #[error("Failed to cancel the install job: {0}")]
    CancelFailed(#[source] ib_io::error::Error),
}
