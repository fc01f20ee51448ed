//! Process spawning and lifecycle management.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, watch};

use super::io::{LineWriter, ResponseFramer};
use super::EngineIo;
use crate::config::SessionConfig;
use crate::signal::ShutdownSignal;
use crate::{Error, Result};

/// A running liquidsfz process and its pipes.
///
/// The child itself is owned by a monitor task that reaps it and publishes
/// its exit status. The monitor kills the engine when asked to terminate,
/// when the handle is dropped, or when the shutdown signal given at spawn
/// time fires, even if nobody is talking to the engine at that moment.
///
/// # Cancellation
///
/// Dropping a `ProcessHandle` will kill the engine if it's still running.
pub struct ProcessHandle {
    pid: Option<u32>,
    writer: LineWriter<ChildStdin>,
    framer: ResponseFramer<ChildStdout>,
    stderr: Option<ChildStderr>,
    exit: watch::Receiver<Option<ExitStatus>>,
    kill: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    /// Spawn the engine described by `config` with all three pipes attached.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        Self::spawn_with_shutdown(config, None)
    }

    /// Like [`spawn`](Self::spawn), but the engine is also killed as soon as
    /// `shutdown` fires.
    pub fn spawn_with_shutdown(
        config: &SessionConfig,
        shutdown: Option<ShutdownSignal>,
    ) -> Result<Self> {
        let mut cmd = build_command(config);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EngineNotFound {
                    searched: config.engine_path().display().to_string(),
                }
            } else {
                Error::Spawn(e)
            }
        })?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take();
        let pid = child.id();

        tracing::debug!(
            pid = ?pid,
            engine = %config.engine_path().display(),
            args = ?config.engine_args(),
            "spawned liquidsfz"
        );

        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(monitor(child, kill_rx, shutdown, exit_tx));

        Ok(Self {
            pid,
            writer: LineWriter::new(stdin),
            framer: ResponseFramer::new(stdout, config.prompt().clone()),
            stderr,
            exit: exit_rx,
            kill: Some(kill_tx),
        })
    }

    /// Take the stderr pipe. It can only be taken once.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Write one command line and flush it.
    ///
    /// Fails with [`Error::ProcessTerminated`] if the engine has already
    /// exited, or if the write fails because it exited meanwhile.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        if let Some(status) = self.exit_status() {
            return Err(terminated(status));
        }

        tracing::debug!(command = %line, "-> liquidsfz");
        let was_open = self.writer.is_open();
        match self.writer.write_line(line).await {
            // A broken stdin means the engine is gone; report how it ended.
            Err(Error::PipeClosed(e)) if was_open => {
                tracing::debug!("liquidsfz stdin closed: {}", e);
                let status = self.wait().await?;
                Err(terminated(status))
            }
            result => result,
        }
    }

    /// Read the next response.
    ///
    /// Fails with [`Error::ProcessTerminated`] if the engine has already
    /// exited, or exits before printing the prompt.
    pub async fn read_response(&mut self) -> Result<String> {
        if let Some(status) = self.exit_status() {
            return Err(terminated(status));
        }

        match self.framer.next_response().await? {
            Some(text) => Ok(text),
            None => {
                let status = self.wait().await?;
                Err(terminated(status))
            }
        }
    }

    /// Get the process ID, or `None` once it has exited.
    pub fn pid(&self) -> Option<u32> {
        if self.is_alive() {
            self.pid
        } else {
            None
        }
    }

    /// Check if the engine is still running.
    pub fn is_alive(&self) -> bool {
        self.exit_status().is_none()
    }

    /// Exit status once the engine has exited and been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        *self.exit.borrow()
    }

    /// Exit code if the engine has exited; `None` while running or when
    /// killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status().and_then(|status| status.code())
    }

    /// Wait for the engine to exit and return its exit status.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self
            .exit
            .wait_for(Option::is_some)
            .await
            .map_err(|_| Error::io(std::io::Error::other("liquidsfz monitor stopped")))?;
        (*status).ok_or_else(|| Error::io(std::io::Error::other("liquidsfz exit status missing")))
    }

    /// Close stdin, signalling end-of-input to the engine.
    pub fn close_stdin(&mut self) {
        self.writer.close();
    }

    /// Ask the monitor to kill the engine without waiting for it.
    ///
    /// Calling this more than once does nothing.
    pub fn terminate(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }

    /// Whether [`terminate`](Self::terminate) was called.
    pub fn is_terminating(&self) -> bool {
        self.kill.is_none()
    }
}

impl EngineIo for ProcessHandle {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        ProcessHandle::write_line(self, line).await
    }

    async fn read_response(&mut self) -> Result<String> {
        ProcessHandle::read_response(self).await
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // Try to kill the process if it's still running
        if self.is_alive() {
            self.terminate();
        }
    }
}

enum MonitorEvent {
    Exited(std::io::Result<ExitStatus>),
    Kill,
    Shutdown,
}

/// Own the child until it exits, killing it on request.
///
/// A dropped kill sender counts as a request.
async fn monitor(
    mut child: Child,
    mut kill: oneshot::Receiver<()>,
    shutdown: Option<ShutdownSignal>,
    exit: watch::Sender<Option<ExitStatus>>,
) {
    let shutdown = async move {
        match shutdown {
            Some(mut signal) => signal.requested().await,
            None => std::future::pending::<()>().await,
        }
    };

    let event = tokio::select! {
        status = child.wait() => MonitorEvent::Exited(status),
        _ = &mut kill => MonitorEvent::Kill,
        _ = shutdown => MonitorEvent::Shutdown,
    };

    let status = match event {
        MonitorEvent::Exited(status) => status,
        MonitorEvent::Kill => kill_and_wait(&mut child).await,
        MonitorEvent::Shutdown => {
            tracing::warn!("shutdown requested, killing liquidsfz");
            kill_and_wait(&mut child).await
        }
    };

    match status {
        Ok(status) => {
            exit.send_replace(Some(status));
        }
        Err(e) => tracing::debug!("failed to wait for liquidsfz: {}", e),
    }
}

async fn kill_and_wait(child: &mut Child) -> std::io::Result<ExitStatus> {
    if let Err(e) = child.start_kill() {
        tracing::debug!("failed to kill liquidsfz: {}", e);
    }
    child.wait().await
}

/// Build a tokio Command from the config.
fn build_command(config: &SessionConfig) -> Command {
    let mut cmd = Command::new(config.engine_path());

    if let Some(dir) = config.working_directory() {
        cmd.current_dir(dir);
    }

    if !config.inherit_env {
        cmd.env_clear();
    }
    for (key, value) in &config.env_vars {
        cmd.env(key, value);
    }

    cmd.args(config.engine_args());
    cmd
}

fn missing_pipe(name: &str) -> Error {
    Error::Spawn(std::io::Error::other(format!("{} was not captured", name)))
}

/// Turn an exit status into the terminal error, logging abnormal exits.
fn terminated(status: ExitStatus) -> Error {
    let exit_code = status.code();
    match exit_code {
        Some(0) => tracing::debug!("liquidsfz exited"),
        Some(code) => tracing::warn!("liquidsfz terminated with exit code {}", code),
        None => tracing::warn!("liquidsfz terminated by signal"),
    }
    Error::ProcessTerminated { exit_code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ShutdownHandle;
    use std::time::Duration;

    fn sh(script: &str) -> SessionConfig {
        SessionConfig::builder()
            .engine_path("sh")
            .args(["-c", script])
            .build()
            .unwrap()
    }

    #[test]
    fn process_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessHandle>();
    }

    #[tokio::test]
    async fn missing_engine_is_reported() {
        let config = SessionConfig::builder()
            .engine_path("/nonexistent/bin/liquidsfz")
            .build()
            .unwrap();

        let err = ProcessHandle::spawn(&config).err().unwrap();
        assert!(matches!(err, Error::EngineNotFound { ref searched } if searched.contains("liquidsfz")));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exited_process_yields_terminated() {
        let mut process = ProcessHandle::spawn(&sh("exit 3")).unwrap();
        let err = process.read_response().await.unwrap_err();
        assert!(matches!(err, Error::ProcessTerminated { exit_code: Some(3) }));
        assert!(!process.is_alive());
        assert_eq!(process.exit_code(), Some(3));
        assert!(process.pid().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_after_exit_reports_exit_code() {
        let mut process =
            ProcessHandle::spawn(&sh("printf 'liquidsfz> '; sleep 0.1; exit 3")).unwrap();
        assert_eq!(process.read_response().await.unwrap(), "");

        tokio::time::sleep(Duration::from_millis(400)).await;

        let err = process.write_line("info").await.unwrap_err();
        assert!(matches!(err, Error::ProcessTerminated { exit_code: Some(3) }));
        assert_eq!(process.exit_code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn broken_stdin_waits_for_exit_status() {
        // stdin closes while the engine still runs, so the write itself fails
        let mut process = ProcessHandle::spawn(&sh("exec 0<&-; sleep 0.2; exit 4")).unwrap();

        let mut result = Ok(());
        for _ in 0..100 {
            result = process.write_line("info").await;
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(matches!(
            result,
            Err(Error::ProcessTerminated { exit_code: Some(4) })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_is_idempotent() {
        let mut process = ProcessHandle::spawn(&sh("sleep 30")).unwrap();
        assert!(process.is_alive());
        assert!(process.pid().is_some());

        process.terminate();
        process.terminate();
        assert!(process.is_terminating());

        let status = process.wait().await.unwrap();
        assert!(!status.success());
        assert!(!process.is_alive());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_kills_idle_engine() {
        let handle = ShutdownHandle::new();
        let mut process =
            ProcessHandle::spawn_with_shutdown(&sh("sleep 30"), Some(handle.subscribe())).unwrap();
        assert!(process.is_alive());

        handle.request();

        let status = tokio::time::timeout(Duration::from_secs(5), process.wait())
            .await
            .expect("engine should be killed")
            .unwrap();
        assert!(status.code().is_none());
        assert!(!process.is_alive());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn echoes_through_pipes() {
        // `sh -c script <sfz>` receives the preset path as $0
        let mut process = ProcessHandle::spawn(&sh(
            "printf 'liquidsfz> '; read line; printf 'got %s\\n' \"$line\"; printf 'liquidsfz> '",
        ))
        .unwrap();
        assert_eq!(process.read_response().await.unwrap(), "");

        process.write_line("info").await.unwrap();
        assert_eq!(process.read_response().await.unwrap(), "got info\n");
    }
}
