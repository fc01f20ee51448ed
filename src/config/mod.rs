//! Configuration for liquidsfz sessions.
//!
//! This module provides:
//!
//! - [`SessionConfig`] and [`SessionConfigBuilder`] for configuring a session
//! - [`Prompt`], the framing sentinel
//! - The few command names known before the catalog exists, in [`commands`]
//!
//! # Example
//!
//! ```ignore
//! use libliquidsfz::config::SessionConfig;
//!
//! let config = SessionConfig::builder()
//!     .sfz_file("strings.sfz")
//!     .env("JACK_NO_START_SERVER", "1")
//!     .build()?;
//! ```

pub mod builder;
pub mod options;

pub use builder::{SessionConfig, SessionConfigBuilder};
pub use options::{
    bundled_empty_sfz, commands, Prompt, DEFAULT_ENGINE, DEFAULT_PROMPT, ENV_ENGINE_BIN,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_exports_accessible() {
        let _: Prompt = Prompt::default();
        let _: &str = commands::HELP;
        let _: &str = commands::QUIT;
        let _: &str = DEFAULT_ENGINE;
        let _: &str = ENV_ENGINE_BIN;
    }

    #[test]
    fn builder_accessible() {
        let _ = SessionConfig::builder();
    }
}
