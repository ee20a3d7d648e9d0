//! The install job manager.
//!
//! A single [`Installer`] tracks at most one install process. Its state lives
//! behind one `RwLock`: transitions and output appends take the write lock,
//! status and log reads take the read lock, so readers always see the state,
//! output and exit code of the same instant.
//!
//! Each started job gets a pump task that drains [`RunEvent`]s from the
//! runner into the shared state. Events of a job that has since been
//! cancelled or replaced are dropped.

use std::sync::Arc;

use ib_io::{
    process::NO_EXIT_CODE,
    runner::{ProcessHandle, RunEvent, Runner},
};
use tokio::sync::{
    RwLock,
    mpsc::{self, UnboundedReceiver},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::parameters::InstallParameters;
use crate::prelude::*;

/// Program and arguments of the install command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InstallCommand {
    pub fn new(program: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lifecycle state of the install job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No job is tracked.
    Idle,
    /// The install process is running.
    Running,
    /// The install process exited; its output and exit code are kept.
    Finished,
}

/// Snapshot of the tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub id: Uuid,
    pub state: JobState,
    /// Output captured so far.
    pub output: Vec<u8>,
    /// Exit code once finished, `-1` before.
    pub exit_code: i32,
    /// Command line once finished, empty before.
    pub command: String,
}

/// Shared handle on the install job. Clones refer to the same job.
#[derive(Clone)]
pub struct Installer {
    command: Arc<InstallCommand>,
    state: Arc<RwLock<InstallerState>>,
}

#[derive(Default)]
struct InstallerState {
    parameters: InstallParameters,
    job: Option<Job>,
    /// Output of the current job. Outlives a cancelled job until the next start.
    output: Vec<u8>,
}

struct Job {
    id: Uuid,
    command: String,
    exit_code: Option<i32>,
    process: ProcessHandle,
}

impl Job {
    fn state(&self) -> JobState {
        match self.exit_code {
            Some(_) => JobState::Finished,
            None => JobState::Running,
        }
    }
}

impl InstallerState {
    /// The running job with this id, if it is still the tracked one.
    fn tracked_job(&mut self, id: Uuid) -> Option<&mut Job> {
        self.job
            .as_mut()
            .filter(|job| job.id == id && job.exit_code.is_none())
    }

    fn is_running(&self) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.state() == JobState::Running)
    }
}

impl Installer {
    pub fn new(command: InstallCommand) -> Self {
        Self {
            command: Arc::new(command),
            state: Arc::new(RwLock::new(InstallerState::default())),
        }
    }

    /// Merge submitted parameters, overwriting existing names.
    ///
    /// Allowed while a job runs; the running process keeps the environment it
    /// was started with.
    pub async fn merge_parameters<I, K, V>(&self, form: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state.write().await.parameters.merge(form);
    }

    pub async fn parameters(&self) -> InstallParameters {
        self.state.read().await.parameters.clone()
    }

    /// Start the install command with the current parameters as environment.
    ///
    /// Returns once the process is spawned. A finished job is replaced; a
    /// running one makes this fail with [`Error::AlreadyRunning`].
    pub async fn start(&self) -> Result<Uuid> {
        let mut state = self.state.write().await;
        if state.is_running() {
            warn!("Refusing to start a second install job");
            return Err(Error::AlreadyRunning);
        }

        state.job = None;
        state.output.clear();

        let runner = Runner::new(&self.command.program, self.command.args.clone()).with_envs(
            state
                .parameters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let process = runner.spawn(tx).map_err(|err| {
            error!("Failed to start install job - {err}");
            Error::Spawn(err)
        })?;

        let id = Uuid::new_v4();
        let command = runner.full_command();
        info!(
            "Install job {id} started: {command} (pid {:?}, {} parameters)",
            process.id(),
            state.parameters.len()
        );
        state.job = Some(Job {
            id,
            command,
            exit_code: None,
            process,
        });
        tokio::spawn(Installer::pump(Arc::clone(&self.state), id, rx));
        Ok(id)
    }

    /// Current job snapshot, [`Error::NoJob`] if nothing is tracked.
    pub async fn status(&self) -> Result<JobStatus> {
        let state = self.state.read().await;
        let job = state.job.as_ref().ok_or(Error::NoJob)?;
        let job_state = job.state();
        Ok(JobStatus {
            id: job.id,
            state: job_state,
            output: state.output.clone(),
            exit_code: job.exit_code.unwrap_or(NO_EXIT_CODE),
            command: match job_state {
                JobState::Finished => job.command.clone(),
                _ => String::new(),
            },
        })
    }

    pub async fn state(&self) -> JobState {
        match &self.state.read().await.job {
            Some(job) => job.state(),
            None => JobState::Idle,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running()
    }

    /// True while a job is tracked, running or finished.
    pub async fn has_job(&self) -> bool {
        self.state.read().await.job.is_some()
    }

    /// Everything captured so far, empty if nothing was ever captured.
    pub async fn output(&self) -> Vec<u8> {
        self.state.read().await.output.clone()
    }

    /// Cancel a running job, or clear a finished one.
    ///
    /// Without a job this does nothing. A finished job is discarded together
    /// with its output. A running job is killed and discarded, but its output
    /// up to this point stays readable through [`Installer::output`]. If the
    /// kill fails the job keeps running and [`Error::CancelFailed`] is
    /// returned.
    pub async fn cancel(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(job) = state.job.as_ref() else {
            debug!("No install job to cancel");
            return Ok(());
        };
        let id = job.id;

        match job.state() {
            JobState::Running => {
                if !job.process.is_alive() {
                    debug!("Install job {id} exited before its status was recorded");
                }
                job.process.terminate().await.map_err(|err| {
                    error!("Failed to stop install job {id} - {err}");
                    Error::CancelFailed(err)
                })?;
                state.job = None;
                info!(
                    "Install job {id} cancelled, keeping {} bytes of output",
                    state.output.len()
                );
            }
            JobState::Finished | JobState::Idle => {
                state.job = None;
                state.output.clear();
                info!("Install job {id} cleared");
            }
        }
        Ok(())
    }

    async fn pump(
        state: Arc<RwLock<InstallerState>>,
        id: Uuid,
        mut rx: UnboundedReceiver<RunEvent>,
    ) {
        while let Some(event) = rx.recv().await {
            let exit_code = match event {
                RunEvent::Output(bytes) => {
                    let mut state = state.write().await;
                    if state.tracked_job(id).is_none() {
                        debug!("Install job {id} is no longer tracked, dropping its events");
                        return;
                    }
                    state.output.extend_from_slice(&bytes);
                    continue;
                }
                RunEvent::Exited(code) => code,
                // Cancel already dropped the job
                RunEvent::Killed => {
                    debug!("Install job {id} was killed");
                    return;
                }
            };

            let mut state = state.write().await;
            match state.tracked_job(id) {
                Some(job) => {
                    info!("Install job {id} finished with exit code {exit_code}");
                    job.exit_code = Some(exit_code);
                }
                None => debug!("Install job {id} exited after it was dropped"),
            }
            return;
        }
    }
}
