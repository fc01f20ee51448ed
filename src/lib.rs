//! # libliquidsfz
//!
//! Async Rust client for the liquidsfz sampler engine's command prompt.
//!
//! The engine is run as a child process. Commands are single lines on its
//! stdin; each response is everything it prints on stdout up to the next
//! `liquidsfz> ` prompt. The command set is not hardcoded: at start the
//! session asks the engine for `help` and exposes whatever it lists.
//!
//! ## Quick Start
//!
//! ```ignore
//! use libliquidsfz::{invoke, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = Session::builder().sfz_file("piano.sfz").start().await?;
//!
//!     for name in session.command_names() {
//!         println!("{}", name);
//!     }
//!
//!     invoke!(session, noteon, 0, 60, 100).await?;
//!     println!("{}", session.invoke("voice_count", Vec::<String>::new()).await?);
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Calls with the wrong number of arguments fail with [`Error::Usage`]
//! before anything is written, and the session stays usable. When the
//! engine exits mid-command the call fails with [`Error::ProcessTerminated`]
//! and every later call with [`Error::SessionTerminated`].
//!
//! ## Configuration
//!
//! ```ignore
//! use libliquidsfz::Session;
//!
//! let mut session = Session::builder()
//!     .engine_path("/opt/liquidsfz/bin/liquidsfz")
//!     .sfz_file("strings.sfz")
//!     .args(["--jack-client", "strings"])
//!     .handle_signals(true)
//!     .start()
//!     .await?;
//! ```
//!
//! Without an explicit path the engine is taken from `LIQUIDSFZ_BIN`, then
//! looked up as `liquidsfz` on `PATH`. Without a preset an empty bundled
//! one is loaded.

pub mod config;
mod error;
pub mod observe;
pub mod process;
pub mod protocol;
mod session;
pub mod signal;

pub use error::{Error, Result};

// Re-export the main session types at crate root
pub use session::{Session, SessionBuilder, SessionState};

// Re-export commonly used config types at crate root
pub use config::{Prompt, SessionConfig, SessionConfigBuilder};

// Re-export commonly used protocol types at crate root
pub use protocol::{CommandCatalog, CommandInvoker, CommandSpec};

// Re-export commonly used process types at crate root
pub use process::{ProcessHandle, StderrQueue};

// Re-export observation and shutdown types at crate root
pub use observe::{EnginePorts, LogLevel, LoggingObserver, PortEvent, PortKind, SessionObserver};
pub use signal::{listen_for_signals, ShutdownHandle};
