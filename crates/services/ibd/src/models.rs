//! JSON bodies returned by the API.

use ib_hardware::Facts;
use ib_job::{InstallParameters, JobState, JobStatus};
use serde::Serialize;

/// Response of `GET /login`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub facts: Facts,
    /// A job is tracked, running or finished.
    pub running: bool,
    /// Parameters submitted so far.
    pub environ: InstallParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessState {
    Running,
    Finished,
}

/// Response of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ProcessState,
    pub output: String,
    pub return_code: i32,
    pub command: String,
}

impl From<JobStatus> for StatusResponse {
    fn from(status: JobStatus) -> Self {
        Self {
            status: match status.state {
                JobState::Running => ProcessState::Running,
                JobState::Finished | JobState::Idle => ProcessState::Finished,
            },
            output: String::from_utf8_lossy(&status.output).into_owned(),
            return_code: status.exit_code,
            command: status.command,
        }
    }
}
