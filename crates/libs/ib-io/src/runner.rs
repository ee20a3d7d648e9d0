//! High-level process runner with event handling.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    sync::{
        mpsc::{self, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, error, warn};

use crate::prelude::*;
use crate::process::{NO_EXIT_CODE, capture_exit_status, exit_code, spawn_process, stop_child};

/// Events emitted while a process runs.
#[derive(Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// Bytes read from stdout or stderr, in arrival order.
    Output(Vec<u8>),
    /// Process exited on its own. Sent after both pipes reached EOF.
    Exited(i32),
    /// Process was terminated through [`ProcessHandle::terminate`].
    Killed,
}

type KillRequest = oneshot::Sender<std::io::Result<()>>;

/// High-level process runner with event-driven output handling.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Command to execute.
    command: String,
    /// Command line arguments.
    args: Vec<String>,
    /// Environment added on top of the inherited one.
    envs: Vec<(String, String)>,
}

/// Handle on a spawned process.
///
/// Dropping the handle does not stop the process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    alive: Arc<AtomicBool>,
    kill_tx: mpsc::Sender<KillRequest>,
}

impl Runner {
    /// Create a new runner with command and arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ib_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
            envs: Vec::new(),
        }
    }

    /// Add environment variables for the child process.
    pub fn with_envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.envs
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Get the full command string with arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ib_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la"]);
    /// assert_eq!(runner.full_command(), "ls -la");
    /// ```
    pub fn full_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the process and start streaming its events into `tx`.
    ///
    /// Returns as soon as the process is launched. Output, then exactly one of
    /// [`RunEvent::Exited`] or [`RunEvent::Killed`], arrive on `tx` afterwards.
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, tx: UnboundedSender<RunEvent>) -> Result<ProcessHandle> {
        let mut child = spawn_process(&self.command, &self.args, self.envs.iter().cloned())
            .map_err(|source| Error::Spawn {
                program: self.command.clone(),
                source,
            })?;
        let pid = child.id();
        debug!("Spawned {} with pid {:?}", self.command, pid);

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(Runner::launch_stream_reader(tx.clone(), stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(Runner::launch_stream_reader(tx.clone(), stderr));
        }

        let alive = Arc::new(AtomicBool::new(true));
        let (kill_tx, kill_rx) = mpsc::channel(1);
        tokio::spawn(Runner::supervise(
            child,
            readers,
            kill_rx,
            tx,
            Arc::clone(&alive),
        ));

        Ok(ProcessHandle {
            pid,
            alive,
            kill_tx,
        })
    }

    async fn read_stream<T: AsyncRead + Unpin>(tx: UnboundedSender<RunEvent>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    if tx.send(RunEvent::Output(buffer[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!("Failed to read process output - {err}");
                    break;
                }
            }
        }
    }

    fn launch_stream_reader<T>(tx: UnboundedSender<RunEvent>, stream: T) -> JoinHandle<()>
    where
        T: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(Runner::read_stream(tx, stream))
    }

    async fn supervise(
        mut child: Child,
        readers: Vec<JoinHandle<()>>,
        mut kill_rx: mpsc::Receiver<KillRequest>,
        tx: UnboundedSender<RunEvent>,
        alive: Arc<AtomicBool>,
    ) {
        // Loop until the process either ends or gets killed
        let event = loop {
            let reply = tokio::select! {
                status = capture_exit_status(&mut child) => {
                    break match status {
                        Ok(status) => RunEvent::Exited(exit_code(status)),
                        Err(err) => {
                            error!("Failed to wait for process - {err}");
                            RunEvent::Exited(NO_EXIT_CODE)
                        }
                    };
                }
                Some(reply) = kill_rx.recv() => reply,
            };
            match stop_child(&mut child).await {
                Ok(()) => {
                    let _ = reply.send(Ok(()));
                    break RunEvent::Killed;
                }
                Err(err) => {
                    error!("Failed to kill process - {err}");
                    let _ = reply.send(Err(err));
                }
            }
        };
        // Late kill requests now see a closed channel
        drop(kill_rx);

        if event == RunEvent::Killed {
            // Orphaned grandchildren may keep the pipes open
            for reader in readers {
                reader.abort();
            }
        } else {
            for reader in readers {
                let _ = reader.await;
            }
        }

        alive.store(false, Ordering::SeqCst);
        let _ = tx.send(event);
    }
}

impl ProcessHandle {
    /// OS process id, if the process was still running when spawned.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// True until the process exit has been observed.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Ask the supervisor to kill the process and wait for the outcome.
    ///
    /// A process that has already exited counts as terminated.
    pub async fn terminate(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.kill_tx.send(reply_tx).await.is_err() {
            return Ok(());
        }
        match reply_rx.await {
            Ok(result) => result.map_err(Error::Kill),
            Err(_) => Ok(()),
        }
    }

    /// Handle on a process that can never be killed. Every
    /// [`terminate`](ProcessHandle::terminate) fails with `PermissionDenied`.
    #[cfg(any(test, feature = "test-util"))]
    pub fn unkillable() -> Self {
        let (kill_tx, mut kill_rx) = mpsc::channel::<KillRequest>(1);
        tokio::spawn(async move {
            while let Some(reply) = kill_rx.recv().await {
                let _ = reply.send(Err(std::io::ErrorKind::PermissionDenied.into()));
            }
        });
        Self {
            pid: None,
            alive: Arc::new(AtomicBool::new(true)),
            kill_tx,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

    use super::*;

    fn shell(script: &str) -> Runner {
        Runner::new("sh", vec!["-c", script])
    }

    async fn collect(mut rx: UnboundedReceiver<RunEvent>) -> (Vec<u8>, RunEvent) {
        timeout(Duration::from_secs(5), async move {
            let mut output = Vec::new();
            while let Some(event) = rx.recv().await {
                match event {
                    RunEvent::Output(bytes) => output.extend(bytes),
                    end => return (output, end),
                }
            }
            panic!("Event channel closed without an end event");
        })
        .await
        .expect("Process did not end in time")
    }

    #[tokio::test]
    async fn test_combined_output_and_exit_code() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = shell("echo out; echo err 1>&2; exit 3")
            .spawn(tx)
            .expect("Failed to spawn");

        let (output, end) = collect(rx).await;
        let output = String::from_utf8(output).expect("Output is not utf8");
        assert!(output.contains("out\n"));
        assert!(output.contains("err\n"));
        assert_eq!(end, RunEvent::Exited(3));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_environment_is_passed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let _handle = shell("printf '%s' \"$IB_TEST_DISK\"")
            .with_envs([("IB_TEST_DISK", "/dev/vda")])
            .spawn(tx)
            .expect("Failed to spawn");

        let (output, end) = collect(rx).await;
        assert_eq!(output, b"/dev/vda");
        assert_eq!(end, RunEvent::Exited(0));
    }

    #[tokio::test]
    async fn test_output_is_streamed_before_exit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = shell("echo first; sleep 30")
            .spawn(tx)
            .expect("Failed to spawn");

        let first = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("No output in time");
        assert_eq!(first, Some(RunEvent::Output(b"first\n".to_vec())));
        assert!(handle.is_alive());

        handle.terminate().await.expect("Failed to terminate");
        let (_, end) = collect(rx).await;
        assert_eq!(end, RunEvent::Killed);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_terminate_kills_background_children() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let marker = dir.path().join("marker");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = shell("(sleep 1; touch \"$MARKER\") & echo started; wait")
            .with_envs([("MARKER", marker.display().to_string())])
            .spawn(tx)
            .expect("Failed to spawn");

        let first = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("No output in time");
        assert_eq!(first, Some(RunEvent::Output(b"started\n".to_vec())));

        handle.terminate().await.expect("Failed to terminate");
        let (_, end) = collect(rx).await;
        assert_eq!(end, RunEvent::Killed);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "background child survived terminate");
    }

    #[tokio::test]
    async fn test_unkillable_handle_reports_kill_error() {
        let handle = ProcessHandle::unkillable();
        assert!(matches!(handle.terminate().await, Err(Error::Kill(_))));
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_terminate_after_exit_succeeds() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = shell("exit 0").spawn(tx).expect("Failed to spawn");
        let (_, end) = collect(rx).await;
        assert_eq!(end, RunEvent::Exited(0));

        handle
            .terminate()
            .await
            .expect("Terminating an exited process should succeed");
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = Runner::new("/nonexistent/install-system", Vec::<String>::new()).spawn(tx);
        assert!(matches!(result, Err(Error::Spawn { .. })));
    }

    #[test]
    fn test_full_command() {
        assert_eq!(
            Runner::new("install-system", vec!["--yes", "--target", "/mnt"]).full_command(),
            "install-system --yes --target /mnt"
        );
        assert_eq!(
            Runner::new("install-system", Vec::<String>::new()).full_command(),
            "install-system"
        );
    }
}
