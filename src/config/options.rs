//! Type-safe options for the liquidsfz engine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prompt the engine prints after every response.
pub const DEFAULT_PROMPT: &str = "liquidsfz> ";

/// Engine binary looked up on `PATH` when no path is configured.
pub const DEFAULT_ENGINE: &str = "liquidsfz";

/// Environment variable overriding the engine binary.
pub const ENV_ENGINE_BIN: &str = "LIQUIDSFZ_BIN";

/// Path of the empty preset bundled with this crate.
///
/// Used when no sfz file is configured, since the engine refuses to start
/// without one.
pub fn bundled_empty_sfz() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("empty.sfz")
}

/// Framing sentinel: the exact prompt string, trailing space included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prompt(pub String);

impl Prompt {
    /// Create a new prompt from a string.
    pub fn new(prompt: impl Into<String>) -> Self {
        Prompt(prompt.into())
    }

    /// Get the prompt as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the prompt as raw bytes, as matched on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Prompt(DEFAULT_PROMPT.to_string())
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt(s)
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt(s.to_string())
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Commands the client relies on before the catalog exists.
///
/// Everything else is discovered from the engine's `help` output.
pub mod commands {
    /// Lists every command with its parameters and a description.
    pub const HELP: &str = "help";
    /// Asks the engine to exit on its own.
    pub const QUIT: &str = "quit";
}
