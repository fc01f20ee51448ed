//! Process management for the liquidsfz engine.
//!
//! One engine process lives for the whole session. Commands go in on stdin,
//! responses come back on stdout separated by the prompt, and diagnostics
//! arrive on stderr where a background task collects them.
//!
//! # Architecture
//!
//! ```text
//! libliquidsfz                            liquidsfz
//! ┌───────────────┐                      ┌─────────────┐
//! │ ProcessHandle │──stdin (commands)───▶│             │
//! │ ResponseFramer│◀─stdout (responses)──│             │
//! │ StderrDrain   │◀─stderr (logs)───────│             │
//! └───────────────┘                      └─────────────┘
//! ```
//!
//! # Wire Protocol
//!
//! - Commands are sent as `name arg1 arg2\n`
//! - Each response ends with the prompt, which is not newline-terminated
//! - `\n` is the line terminator on every platform

use std::future::Future;

mod drain;
mod io;
mod spawn;

pub use drain::{StderrDrain, StderrQueue};
pub use io::{LineWriter, ResponseFramer};
pub use spawn::ProcessHandle;

use crate::Result;

/// Byte ending every line in both directions.
pub const LINE_TERMINATOR: u8 = b'\n';

/// A request/response channel to an engine.
///
/// Implemented by [`ProcessHandle`] for a live process; tests implement it
/// over in-memory streams.
pub trait EngineIo: Send {
    /// Write one command line and flush it.
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read everything up to the next prompt.
    fn read_response(&mut self) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessHandle>();
        assert_send_sync::<StderrQueue>();
    }

    #[test]
    fn line_terminator_is_newline() {
        assert_eq!(LINE_TERMINATOR, b'\n');
    }
}
