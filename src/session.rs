//! A running liquidsfz engine and its discovered commands.
//!
//! This module provides [`Session`], which owns the engine process, keeps
//! its stderr drained, learns the command set from `help`, and runs one
//! command at a time.
//!
//! # Example
//!
//! ```ignore
//! use libliquidsfz::{invoke, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = Session::builder().sfz_file("piano.sfz").start().await?;
//!
//!     println!("{}", session.invoke("info", Vec::<String>::new()).await?);
//!     println!("{}", invoke!(session, max_voices, 8).await?);
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{commands, SessionConfig, SessionConfigBuilder};
use crate::observe::SessionObserver;
use crate::process::{ProcessHandle, StderrDrain, StderrQueue};
use crate::protocol::{round_trip, stringify_args, CommandCatalog, CommandInvoker};
use crate::signal::{listen_for_signals, ShutdownHandle, ShutdownSignal};
use crate::{Error, Result};

/// Lifecycle of a [`Session`].
///
/// `Created → Starting → Ready → Terminated`, or straight from `Starting`
/// to `Terminated` when bootstrap fails. `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Configured, no process yet.
    Created,
    /// Process spawned, banner and help not yet read.
    Starting,
    /// Catalog built; commands can be invoked.
    Ready,
    /// Process gone or being killed.
    Terminated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A liquidsfz engine driven over its command prompt.
///
/// Commands are not hardcoded: at start the session sends `help` and every
/// listed command becomes callable through [`invoke`](Self::invoke) (or the
/// [`invoke!`](crate::invoke) macro), with its argument count checked
/// before anything is written.
///
/// # Concurrency
///
/// Calls take `&mut self`, so at most one command is in flight and
/// responses come back in the order commands were sent. Stderr is read by
/// a background task; use [`stderr_queue`](Self::stderr_queue) to watch it
/// while a command is running.
///
/// # Cancellation
///
/// Dropping a `Session` kills the engine if it's still running. So does a
/// request on the [`shutdown_handle`](Self::shutdown_handle), even while no
/// command is running; the next call then fails with
/// [`Error::SessionTerminated`].
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    process: Option<ProcessHandle>,
    drain: Option<StderrDrain>,
    stderr: StderrQueue,
    catalog: CommandCatalog,
    help_text: String,
    exit_code: Option<i32>,
    shutdown: ShutdownHandle,
    shutdown_signal: ShutdownSignal,
    signal_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Create a session in the `Created` state. Nothing is spawned until
    /// [`start`](Self::start).
    pub fn new(config: SessionConfig) -> Self {
        Self::with_shutdown(config, ShutdownHandle::new())
    }

    /// Like [`new`](Self::new), but obeying an existing shutdown handle.
    pub fn with_shutdown(config: SessionConfig, shutdown: ShutdownHandle) -> Self {
        let shutdown_signal = shutdown.subscribe();
        Self {
            config,
            state: SessionState::Created,
            process: None,
            drain: None,
            stderr: StderrQueue::new(),
            catalog: CommandCatalog::default(),
            help_text: String::new(),
            exit_code: None,
            shutdown,
            shutdown_signal,
            signal_task: None,
        }
    }

    /// Create a builder that configures and starts a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Create and start a session with the given configuration.
    pub async fn start_with(config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.start().await?;
        Ok(session)
    }

    /// Spawn the engine and learn its commands.
    ///
    /// Starts the stderr drain, discards the banner, sends `help` and
    /// parses the reply into the catalog. Any failure leaves the session
    /// terminated.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Created {
            return Err(Error::InvalidState {
                expected: SessionState::Created.as_str(),
                actual: self.state.as_str(),
            });
        }
        self.state = SessionState::Starting;

        let shutdown = Some(self.shutdown.subscribe());
        let mut process = match ProcessHandle::spawn_with_shutdown(&self.config, shutdown) {
            Ok(process) => process,
            Err(e) => {
                self.state = SessionState::Terminated;
                return Err(e);
            }
        };

        if let Some(stderr) = process.take_stderr() {
            let observer = self.config.observer().cloned();
            self.drain = Some(StderrDrain::start(stderr, self.stderr.clone(), observer));
        }
        self.process = Some(process);

        if self.config.handle_signals() {
            self.signal_task = Some(listen_for_signals(self.shutdown.clone()));
        }

        let banner = self.exchange(None).await?;
        tracing::debug!(banner = %banner.trim(), "discarded banner");

        let help_text = self.exchange(Some(commands::HELP)).await?;
        self.catalog = CommandCatalog::parse(&help_text);
        self.help_text = help_text;
        tracing::debug!(commands = self.catalog.len(), "command catalog ready");

        self.state = SessionState::Ready;
        Ok(())
    }

    /// Call a discovered command.
    ///
    /// Arguments are stringified with `Display` and joined by single spaces.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `help` never listed `name`
    /// - [`Error::Usage`] if the argument count is wrong; nothing is written
    /// - [`Error::ProcessTerminated`] if the engine exits before answering
    /// - [`Error::SessionTerminated`] once the session is terminated
    pub async fn invoke<I>(&mut self, name: &str, args: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        self.ensure_ready()?;

        let invoker = self.invoker(name)?;
        let line = invoker.command_line(&stringify_args(args))?;
        self.exchange(Some(&line)).await
    }

    /// Look up the invoker for a discovered command.
    pub fn invoker(&self, name: &str) -> Result<CommandInvoker> {
        self.catalog
            .get(name)
            .cloned()
            .map(CommandInvoker::new)
            .ok_or_else(|| Error::UnknownCommand {
                name: name.to_string(),
            })
    }

    /// Ask the engine to exit and wait for it.
    ///
    /// Returns the exit code (`None` if it was killed by a signal).
    pub async fn quit(&mut self) -> Result<Option<i32>> {
        self.ensure_ready()?;
        self.notify_command(commands::QUIT);

        let Some(process) = self.process.as_mut() else {
            return Err(Error::SessionTerminated);
        };
        let result = match process.write_line(commands::QUIT).await {
            Ok(()) => process.wait().await.map(|status| status.code()),
            Err(e) => Err(e),
        };

        match result {
            Ok(code) => {
                self.mark_terminated(code);
                Ok(code)
            }
            Err(e) => {
                self.mark_terminated(e.exit_code());
                Err(e)
            }
        }
    }

    /// Kill the engine without waiting for it to exit.
    ///
    /// Calling this again, or on a session that never started, does nothing.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Created {
            self.state = SessionState::Terminated;
            return;
        }
        self.mark_terminated(None);
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Whether the engine process is still running.
    pub fn is_alive(&self) -> bool {
        self.process.as_ref().is_some_and(|p| p.is_alive())
    }

    /// Exit code reported when the engine exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Process ID of the engine while it runs.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// Commands discovered at start. Empty before the session is ready.
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Names of every discovered command, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        self.catalog.names().collect()
    }

    /// Raw `help` response the catalog was parsed from.
    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    // -------------------------------------------------------------------------
    // Stderr
    // -------------------------------------------------------------------------

    /// Take every stderr line captured so far.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr.drain()
    }

    /// Take every stderr line captured so far, joined by newlines.
    pub fn stderr_text(&self) -> String {
        self.stderr.drain_text()
    }

    /// Shared handle to the stderr queue, usable while a command runs.
    pub fn stderr_queue(&self) -> StderrQueue {
        self.stderr.clone()
    }

    // -------------------------------------------------------------------------
    // Shutdown
    // -------------------------------------------------------------------------

    /// Handle that terminates this session when requested.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_ready(&mut self) -> Result<()> {
        if self.shutdown.is_requested() && self.state != SessionState::Terminated {
            tracing::warn!("shutdown requested, terminating liquidsfz");
            self.terminate();
        }

        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Terminated => Err(Error::SessionTerminated),
            other => Err(Error::InvalidState {
                expected: SessionState::Ready.as_str(),
                actual: other.as_str(),
            }),
        }
    }

    /// Write `line` (if any) and frame the next response, racing a shutdown
    /// request. Any failure here ends the session.
    async fn exchange(&mut self, line: Option<&str>) -> Result<String> {
        if let Some(line) = line {
            self.notify_command(line);
        }

        let Some(process) = self.process.as_mut() else {
            return Err(Error::SessionTerminated);
        };

        let outcome = tokio::select! {
            biased;
            _ = self.shutdown_signal.requested() => None,
            result = async {
                match line {
                    Some(line) => round_trip(process, line).await,
                    None => process.read_response().await,
                }
            } => Some(result),
        };

        match outcome {
            None => {
                tracing::warn!("shutdown requested, terminating liquidsfz");
                self.mark_terminated(None);
                Err(Error::SessionTerminated)
            }
            Some(Ok(response)) => {
                if let Some(obs) = self.config.observer() {
                    obs.on_response(command_name(line), &response);
                }
                Ok(response)
            }
            Some(Err(e)) => {
                self.mark_terminated(e.exit_code());
                Err(e)
            }
        }
    }

    fn notify_command(&self, line: &str) {
        if let Some(obs) = self.config.observer() {
            obs.on_command(line);
        }
    }

    /// Enter the terminal state once: kill the engine if it still runs and
    /// tell the observer.
    fn mark_terminated(&mut self, exit_code: Option<i32>) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.state = SessionState::Terminated;
        self.exit_code = exit_code;

        if let Some(process) = self.process.as_mut() {
            if process.is_alive() {
                process.terminate();
            }
        }
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        if let Some(obs) = self.config.observer() {
            obs.on_terminated(exit_code);
        }
    }
}

/// Command name of a line, or empty for the banner.
fn command_name(line: Option<&str>) -> &str {
    line.and_then(|l| l.split(' ').next()).unwrap_or("")
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("pid", &self.pid())
            .field("commands", &self.catalog.len())
            .field("exit_code", &self.exit_code)
            .field("stderr_drain", &self.drain.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
    }
}

/// Builder for a [`Session`].
///
/// This wraps [`SessionConfigBuilder`] and builds directly into a session.
///
/// # Example
///
/// ```ignore
/// let mut session = Session::builder()
///     .engine_path("/usr/local/bin/liquidsfz")
///     .sfz_file("strings.sfz")
///     .handle_signals(true)
///     .start()
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    inner: SessionConfigBuilder,
    shutdown: Option<ShutdownHandle>,
}

impl SessionBuilder {
    /// Create a new session builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the session without starting it.
    pub fn build(self) -> Result<Session> {
        let config = self.inner.build()?;
        Ok(match self.shutdown {
            Some(handle) => Session::with_shutdown(config, handle),
            None => Session::new(config),
        })
    }

    /// Build and start the session.
    pub async fn start(self) -> Result<Session> {
        let mut session = self.build()?;
        session.start().await?;
        Ok(session)
    }

    /// Path to the liquidsfz binary.
    pub fn engine_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.engine_path(path);
        self
    }

    /// Preset to load.
    pub fn sfz_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.sfz_file(path);
        self
    }

    /// Add one engine option.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.inner = self.inner.arg(arg);
        self
    }

    /// Add several engine options.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inner = self.inner.args(args);
        self
    }

    /// Override the framing prompt.
    pub fn prompt(mut self, prompt: impl Into<crate::config::Prompt>) -> Self {
        self.inner = self.inner.prompt(prompt);
        self
    }

    /// Working directory for the engine process.
    pub fn working_directory(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.working_directory(path);
        self
    }

    /// Add/override environment variable for the engine.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.env(key, value);
        self
    }

    /// Don't inherit parent environment (default: inherit).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inner = self.inner.inherit_env(inherit);
        self
    }

    /// Terminate the engine on Ctrl-C or SIGTERM.
    pub fn handle_signals(mut self, handle: bool) -> Self {
        self.inner = self.inner.handle_signals(handle);
        self
    }

    /// Obey an existing shutdown handle, e.g. one shared by several sessions.
    pub fn shutdown_handle(mut self, handle: ShutdownHandle) -> Self {
        self.shutdown = Some(handle);
        self
    }

    /// Receive callbacks for commands, responses, stderr lines and exit.
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.inner = self.inner.observer(observer);
        self
    }
}

/// Call a discovered command as if it were a method.
///
/// `invoke!(session, noteon, 0, 60, 100)` is
/// `session.invoke("noteon", ["0", "60", "100"])`; arguments may have
/// different types as long as they implement `Display`.
///
/// ```ignore
/// let voices = invoke!(session, voice_count).await?;
/// invoke!(session, gain, 0.5).await?;
/// ```
#[macro_export]
macro_rules! invoke {
    ($session:expr, $command:ident $(, $arg:expr)* $(,)?) => {
        $session.invoke(
            ::std::stringify!($command),
            ::std::vec::Vec::<::std::string::String>::from([
                $(::std::string::ToString::to_string(&$arg)),*
            ]),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::builder()
            .engine_path("/nonexistent/bin/liquidsfz")
            .build()
            .unwrap()
    }

    #[test]
    fn session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
        assert_send_sync::<SessionBuilder>();
        assert_send_sync::<SessionState>();
    }

    #[test]
    fn state_names() {
        assert_eq!(SessionState::Created.to_string(), "created");
        assert_eq!(SessionState::Starting.as_str(), "starting");
        assert_eq!(SessionState::Ready.as_str(), "ready");
        assert_eq!(SessionState::Terminated.to_string(), "terminated");
    }

    #[test]
    fn new_session_is_created() {
        let session = Session::new(config());
        assert_eq!(session.state(), SessionState::Created);
        assert!(session.catalog().is_empty());
        assert!(session.pid().is_none());
        assert!(session.help_text().is_empty());
    }

    #[tokio::test]
    async fn invoke_before_start_is_invalid_state() {
        let mut session = Session::new(config());
        let err = session.invoke("info", Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: "ready",
                actual: "created"
            }
        ));
    }

    #[tokio::test]
    async fn spawn_failure_terminates() {
        let mut session = Session::new(config());
        let err = session.start().await.unwrap_err();

        assert!(matches!(err, Error::EngineNotFound { .. }));
        assert!(session.is_terminated());

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn terminate_unstarted_session() {
        let mut session = Session::new(config());
        session.terminate();
        session.terminate();
        assert!(session.is_terminated());

        let err = session.invoke("info", Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, Error::SessionTerminated));
    }

    #[test]
    fn unknown_command_lookup() {
        let session = Session::new(config());
        let err = session.invoker("bad_command").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand { ref name } if name == "bad_command"));
    }

    #[test]
    fn command_name_from_line() {
        assert_eq!(command_name(Some("max_voices 8")), "max_voices");
        assert_eq!(command_name(Some("info")), "info");
        assert_eq!(command_name(None), "");
    }

    #[test]
    fn builder_builds_unstarted_session() {
        let session = Session::builder()
            .engine_path("/nonexistent/bin/liquidsfz")
            .prompt("sfz> ")
            .build()
            .unwrap();

        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.config().prompt().as_str(), "sfz> ");
    }

    #[test]
    fn builder_shares_shutdown_handle() {
        let handle = ShutdownHandle::new();
        let session = Session::builder()
            .shutdown_handle(handle.clone())
            .build()
            .unwrap();

        handle.request();
        assert!(session.shutdown_handle().is_requested());
    }
}
