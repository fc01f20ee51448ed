/// Errors that can occur when driving a liquidsfz engine.
///
/// Errors fall into two tiers:
/// - Fatal errors end the session: spawn failures, closed pipes, engine exit
/// - Recoverable errors are local to one call: wrong arity, unknown command
///
/// Use [`Error::is_fatal`] and [`Error::is_recoverable`] to tell them apart.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration errors (detected at build() time)
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -------------------------------------------------------------------------
    // Spawn errors
    // -------------------------------------------------------------------------
    /// Engine binary not found.
    #[error("liquidsfz engine not found (searched: {searched})")]
    EngineNotFound { searched: String },

    /// Failed to spawn the engine process.
    #[error("failed to spawn liquidsfz process: {0}")]
    Spawn(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Lifecycle errors
    // -------------------------------------------------------------------------
    /// A command was written after the engine's stdin closed.
    #[error("engine stdin closed: {0}")]
    PipeClosed(#[source] std::io::Error),

    /// The engine exited instead of producing a prompt.
    ///
    /// `exit_code` is `None` when the process was killed by a signal.
    #[error("liquidsfz terminated (exit code {})", display_exit_code(.exit_code))]
    ProcessTerminated { exit_code: Option<i32> },

    /// The session was already terminated.
    #[error("session terminated")]
    SessionTerminated,

    /// Operation called in the wrong lifecycle state.
    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    // -------------------------------------------------------------------------
    // Command errors (recoverable)
    // -------------------------------------------------------------------------
    /// Wrong number of arguments for a discovered command.
    #[error("usage: {command}({params}) # {description}", params = .expected_params.join(", "))]
    Usage {
        command: String,
        expected_params: Vec<String>,
        description: String,
    },

    /// The engine never advertised a command with this name.
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// An argument would break the line protocol (embedded line break).
    #[error("invalid argument for {command}: {argument:?}")]
    InvalidArgument { command: String, argument: String },

    // -------------------------------------------------------------------------
    // IO errors
    // -------------------------------------------------------------------------
    /// IO error communicating with the engine.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
}

/// A specialized Result type for libliquidsfz operations.
pub type Result<T> = std::result::Result<T, Error>;

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl Error {
    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Check if this error ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EngineNotFound { .. }
                | Error::Spawn(_)
                | Error::PipeClosed(_)
                | Error::ProcessTerminated { .. }
                | Error::SessionTerminated
        )
    }

    /// Check if the caller can carry on using the session after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Usage { .. } | Error::UnknownCommand { .. } | Error::InvalidArgument { .. }
        )
    }

    /// Exit code of the engine, if this error reports one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ProcessTerminated { exit_code } => *exit_code,
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn usage_error_message() {
        let err = Error::Usage {
            command: "noteon".into(),
            expected_params: vec!["chan".into(), "key".into(), "vel".into()],
            description: "start note".into(),
        };
        assert_eq!(err.to_string(), "usage: noteon(chan, key, vel) # start note");
    }

    #[test]
    fn usage_error_message_without_params() {
        let err = Error::Usage {
            command: "info".into(),
            expected_params: vec![],
            description: "print information".into(),
        };
        assert_eq!(err.to_string(), "usage: info() # print information");
    }

    #[test]
    fn terminated_message() {
        assert_eq!(
            Error::ProcessTerminated { exit_code: Some(3) }.to_string(),
            "liquidsfz terminated (exit code 3)"
        );
        assert_eq!(
            Error::ProcessTerminated { exit_code: None }.to_string(),
            "liquidsfz terminated (exit code none)"
        );
    }

    #[test]
    fn fatal_detection() {
        assert!(Error::ProcessTerminated { exit_code: Some(0) }.is_fatal());
        assert!(Error::SessionTerminated.is_fatal());
        assert!(Error::EngineNotFound {
            searched: "liquidsfz".into()
        }
        .is_fatal());
        assert!(Error::PipeClosed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "closed"
        ))
        .is_fatal());
        assert!(!Error::UnknownCommand { name: "x".into() }.is_fatal());
        assert!(!Error::InvalidConfig("bad".into()).is_fatal());
    }

    #[test]
    fn recoverable_detection() {
        assert!(Error::UnknownCommand {
            name: "bad_command".into()
        }
        .is_recoverable());
        assert!(Error::Usage {
            command: "gain".into(),
            expected_params: vec!["g".into()],
            description: "set gain".into(),
        }
        .is_recoverable());
        assert!(!Error::SessionTerminated.is_recoverable());
    }

    #[test]
    fn exit_code_accessor() {
        assert_eq!(
            Error::ProcessTerminated { exit_code: Some(2) }.exit_code(),
            Some(2)
        );
        assert_eq!(Error::SessionTerminated.exit_code(), None);
    }

    #[test]
    fn question_mark_operator_io() {
        fn fallible_io() -> Result<()> {
            let _file = std::fs::File::open("/nonexistent/path/that/does/not/exist")?;
            Ok(())
        }
        assert!(matches!(fallible_io(), Err(Error::Io(_))));
    }
}
