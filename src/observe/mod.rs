//! Observation hooks for a running session.
//!
//! This module provides the [`SessionObserver`] trait for watching commands,
//! responses, stderr output and termination, and [`EnginePorts`] for picking
//! the engine's ports out of an audio server's registration events.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use libliquidsfz::{Session, SessionObserver};
//!
//! struct StderrPrinter;
//!
//! impl SessionObserver for StderrPrinter {
//!     fn on_stderr_line(&self, line: &str) {
//!         eprintln!("liquidsfz: {}", line);
//!     }
//! }
//!
//! let session = Session::builder()
//!     .observer(Arc::new(StderrPrinter))
//!     .start()
//!     .await?;
//! ```

mod observer;
mod ports;

pub use observer::{LogLevel, LoggingObserver, SessionObserver};
pub use ports::{EnginePorts, PortEvent, PortKind, ENGINE_CLIENT_NAME};
