//! Probe error types.

use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
}
