//! Process error types.

/// Errors raised while launching or stopping a process.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The executable could not be found or launched.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The kill signal could not be delivered.
    #[error("Failed to kill process: {0}")]
    Kill(#[source] std::io::Error),
}
