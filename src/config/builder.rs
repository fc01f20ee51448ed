//! Session configuration and builder.
//!
//! # Example
//!
//! ```ignore
//! use libliquidsfz::config::SessionConfig;
//!
//! let config = SessionConfig::builder()
//!     .engine_path("/usr/local/bin/liquidsfz")
//!     .sfz_file("piano.sfz")
//!     .build()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::options::{bundled_empty_sfz, Prompt, DEFAULT_ENGINE, ENV_ENGINE_BIN};
use crate::observe::SessionObserver;
use crate::{Error, Result};

/// Configuration for one liquidsfz session.
///
/// Use [`SessionConfig::builder()`] to create a new configuration.
#[derive(Clone)]
pub struct SessionConfig {
    pub(crate) engine_path: PathBuf,
    pub(crate) sfz_file: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) prompt: Prompt,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) env_vars: HashMap<String, String>,
    pub(crate) inherit_env: bool,
    pub(crate) handle_signals: bool,
    pub(crate) observer: Option<Arc<dyn SessionObserver>>,
}

impl SessionConfig {
    /// Create a new builder for SessionConfig.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Engine binary that will be spawned.
    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    /// Preset passed to the engine.
    pub fn sfz_file(&self) -> &Path {
        &self.sfz_file
    }

    /// Prompt used to frame responses.
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Get the working directory if set.
    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }

    /// Whether the session listens for Ctrl-C/SIGTERM itself.
    pub fn handle_signals(&self) -> bool {
        self.handle_signals
    }

    /// Get the session observer if set.
    pub fn observer(&self) -> Option<&Arc<dyn SessionObserver>> {
        self.observer.as_ref()
    }

    /// Full argument list: extra options first, preset last.
    pub(crate) fn engine_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(self.sfz_file.display().to_string());
        args
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("engine_path", &self.engine_path)
            .field("sfz_file", &self.sfz_file)
            .field("args", &self.args)
            .field("prompt", &self.prompt)
            .field("working_directory", &self.working_directory)
            .field("env_vars", &self.env_vars)
            .field("inherit_env", &self.inherit_env)
            .field("handle_signals", &self.handle_signals)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Builder for [`SessionConfig`].
///
/// Validation happens in [`build()`](SessionConfigBuilder::build). The engine
/// binary itself is only looked up at spawn time.
#[derive(Clone)]
pub struct SessionConfigBuilder {
    engine_path: Option<PathBuf>,
    sfz_file: Option<PathBuf>,
    args: Vec<String>,
    prompt: Prompt,
    working_directory: Option<PathBuf>,
    env_vars: HashMap<String, String>,
    inherit_env: bool,
    handle_signals: bool,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self {
            engine_path: None,
            sfz_file: None,
            args: Vec::new(),
            prompt: Prompt::default(),
            working_directory: None,
            env_vars: HashMap::new(),
            inherit_env: true,
            handle_signals: false,
            observer: None,
        }
    }
}

impl fmt::Debug for SessionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfigBuilder")
            .field("engine_path", &self.engine_path)
            .field("sfz_file", &self.sfz_file)
            .field("args", &self.args)
            .field("prompt", &self.prompt)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionConfigBuilder {
    // -------------------------------------------------------------------------
    // Engine
    // -------------------------------------------------------------------------

    /// Path to the liquidsfz binary (default: `$LIQUIDSFZ_BIN`, else `liquidsfz` on PATH).
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_path = Some(path.into());
        self
    }

    /// Preset to load (default: the bundled empty preset).
    pub fn sfz_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sfz_file = Some(path.into());
        self
    }

    /// Add one engine option, placed before the preset path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several engine options, placed before the preset path.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the prompt used to frame responses.
    pub fn prompt(mut self, prompt: impl Into<Prompt>) -> Self {
        self.prompt = prompt.into();
        self
    }

    // -------------------------------------------------------------------------
    // Process options
    // -------------------------------------------------------------------------

    /// Working directory for the engine process.
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add/override environment variable for the engine.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Don't inherit parent environment (default: inherit).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Terminate the engine on Ctrl-C or SIGTERM (default: off).
    ///
    /// The listener is spawned when the session starts.
    pub fn handle_signals(mut self, handle: bool) -> Self {
        self.handle_signals = handle;
        self
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Receive callbacks for commands, responses, stderr lines and exit.
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Build the configuration.
    ///
    /// This validates:
    /// - The prompt is not empty and fits on one line
    /// - The preset file exists
    /// - The working directory exists if specified
    pub fn build(self) -> Result<SessionConfig> {
        if self.prompt.as_str().is_empty() {
            return Err(Error::InvalidConfig("prompt must not be empty".into()));
        }
        if self.prompt.as_str().contains('\n') {
            return Err(Error::InvalidConfig(
                "prompt must not contain a line break".into(),
            ));
        }

        let sfz_file = self.sfz_file.unwrap_or_else(bundled_empty_sfz);
        if !sfz_file.exists() {
            return Err(Error::InvalidConfig(format!(
                "sfz file does not exist: {}",
                sfz_file.display()
            )));
        }

        if let Some(ref dir) = self.working_directory {
            if !dir.is_dir() {
                return Err(Error::InvalidConfig(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        let engine_path = self
            .engine_path
            .or_else(|| std::env::var_os(ENV_ENGINE_BIN).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE));

        Ok(SessionConfig {
            engine_path,
            sfz_file,
            args: self.args,
            prompt: self.prompt,
            working_directory: self.working_directory,
            env_vars: self.env_vars,
            inherit_env: self.inherit_env,
            handle_signals: self.handle_signals,
            observer: self.observer,
        })
    }
}
