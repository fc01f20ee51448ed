//! Session observer trait and implementations.

/// Observer for session events.
///
/// Implementations receive callbacks as commands are written, responses
/// framed, stderr lines captured and the engine terminates. This is for
/// observation only; it cannot change what the session does.
///
/// # Implementation Notes
///
/// - Implementations must be lightweight; blocking delays the session.
/// - Methods have default empty implementations for selective observation.
/// - `on_stderr_line` is called from the stderr drain task, the others
///   from the task driving the session.
pub trait SessionObserver: Send + Sync {
    /// Called after a command line has been written to the engine.
    fn on_command(&self, line: &str) {
        let _ = line;
    }

    /// Called when the response to `command` has been framed.
    fn on_response(&self, command: &str, response: &str) {
        let _ = (command, response);
    }

    /// Called for every line the engine writes to stderr, already trimmed.
    fn on_stderr_line(&self, line: &str) {
        let _ = line;
    }

    /// Called once when the session reaches its terminal state.
    ///
    /// `exit_code` is known when the engine exited on its own.
    fn on_terminated(&self, exit_code: Option<i32>) {
        let _ = exit_code;
    }
}

/// Simple logging observer that logs session events using tracing.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use libliquidsfz::{LoggingObserver, Session};
///
/// let session = Session::builder()
///     .observer(Arc::new(LoggingObserver::new()))
///     .start()
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    level: LogLevel,
}

/// Log level for LoggingObserver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at trace level.
    Trace,
    /// Log at debug level (default).
    #[default]
    Debug,
    /// Log at info level.
    Info,
}

impl LoggingObserver {
    /// Create a new logging observer with debug level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging observer with a specific level.
    pub fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

/// Shorten long responses for log output.
fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.len() <= LIMIT {
        return text.to_string();
    }
    let mut end = LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], text.len())
}

impl SessionObserver for LoggingObserver {
    fn on_command(&self, line: &str) {
        match self.level {
            LogLevel::Trace => tracing::trace!(command = %line, "command"),
            LogLevel::Debug => tracing::debug!(command = %line, "command"),
            LogLevel::Info => tracing::info!(command = %line, "command"),
        }
    }

    fn on_response(&self, command: &str, response: &str) {
        let shown = truncate_for_log(response);
        match self.level {
            LogLevel::Trace => tracing::trace!(command = %command, response = %shown, "response"),
            LogLevel::Debug => tracing::debug!(command = %command, response = %shown, "response"),
            LogLevel::Info => tracing::info!(command = %command, response = %shown, "response"),
        }
    }

    fn on_stderr_line(&self, line: &str) {
        match self.level {
            LogLevel::Trace => tracing::trace!(line = %line, "stderr"),
            LogLevel::Debug => tracing::debug!(line = %line, "stderr"),
            LogLevel::Info => tracing::info!(line = %line, "stderr"),
        }
    }

    fn on_terminated(&self, exit_code: Option<i32>) {
        match self.level {
            LogLevel::Trace => tracing::trace!(?exit_code, "terminated"),
            LogLevel::Debug => tracing::debug!(?exit_code, "terminated"),
            LogLevel::Info => tracing::info!(?exit_code, "terminated"),
        }
    }
}
