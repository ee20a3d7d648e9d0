//! Low-level async process management utilities.

use std::{
    ffi::OsStr,
    io,
    process::{ExitStatus, Stdio},
};

use nix::{
    errno::Errno,
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use tokio::process::{Child, Command};

/// Exit code reported when a process has no code of its own (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// Spawn a new async process with piped stdout and stderr.
///
/// The child inherits the current environment, extended with `envs`. Stdin is
/// closed so an install script waiting for input fails instead of hanging.
/// The child leads a new process group so [`stop_child`] reaches everything
/// it started.
///
/// # Arguments
///
/// * `cmd` - Command to execute
/// * `args` - Command line arguments
/// * `envs` - Extra environment variables for the child
pub fn spawn_process<I, K, V>(cmd: &str, args: &[String], envs: I) -> Result<Child, io::Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    Command::new(OsStr::new(cmd))
        .args(args)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
}

/// Asynchronously terminate a child process and its process group.
///
/// Sends `SIGKILL` to the group led by the child, then kills and reaps the
/// child itself.
pub async fn stop_child(child: &mut Child) -> Result<(), io::Error> {
    if let Some(pid) = child.id() {
        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => return Err(errno.into()),
        }
    }
    child.kill().await
}

/// Asynchronously capture the exit status of a child process.
pub async fn capture_exit_status(child: &mut Child) -> Result<ExitStatus, io::Error> {
    child.wait().await
}

/// Numeric exit code of a finished process, [`NO_EXIT_CODE`] if it was signalled.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(NO_EXIT_CODE)
}
