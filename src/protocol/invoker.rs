//! Arity-checked calls to catalog commands.

use std::fmt;
use std::sync::Arc;

use super::catalog::CommandSpec;
use crate::process::EngineIo;
use crate::{Error, Result};

/// A callable bound to one catalog entry.
///
/// Validates the argument count, renders the command line, writes it and
/// returns the framed response. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    spec: Arc<CommandSpec>,
}

impl CommandInvoker {
    /// Bind an invoker to a command.
    pub fn new(spec: Arc<CommandSpec>) -> Self {
        Self { spec }
    }

    /// The command this invoker calls.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Fail with [`Error::Usage`] unless exactly one argument per parameter
    /// is given.
    pub fn check_arity(&self, args: &[String]) -> Result<()> {
        if args.len() != self.spec.arity() {
            return Err(Error::Usage {
                command: self.spec.name.clone(),
                expected_params: self.spec.params.clone(),
                description: self.spec.description.clone(),
            });
        }
        Ok(())
    }

    /// Render `name arg1 arg2 ...` (just `name` without arguments).
    ///
    /// Arguments containing a line break are rejected since they would
    /// split into a second command on the wire.
    pub fn command_line(&self, args: &[String]) -> Result<String> {
        self.check_arity(args)?;

        if let Some(arg) = args.iter().find(|a| a.contains(['\n', '\r'])) {
            return Err(Error::InvalidArgument {
                command: self.spec.name.clone(),
                argument: arg.clone(),
            });
        }

        let mut line = self.spec.name.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        Ok(line)
    }

    /// Call the command over `io` and return its response.
    ///
    /// Nothing is written when validation fails.
    pub async fn invoke<E: EngineIo>(&self, io: &mut E, args: &[String]) -> Result<String> {
        let line = self.command_line(args)?;
        round_trip(io, &line).await
    }
}

/// Write one command line and frame the response to it.
pub async fn round_trip<E: EngineIo>(io: &mut E, line: &str) -> Result<String> {
    io.write_line(line).await?;
    io.read_response().await
}

/// Stringify arguments the way they appear on the command line.
pub fn stringify_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    args.into_iter().map(|a| a.to_string()).collect()
}
