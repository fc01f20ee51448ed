//! The engine's command protocol.
//!
//! The engine describes itself: `help` lists every command with its
//! parameter names and a description, one per line:
//!
//! ```text
//! max_voices n         - set maximum number of voices
//! noteon chan key vel  - start note
//! ```
//!
//! [`CommandCatalog`] parses that listing into [`CommandSpec`]s, and a
//! [`CommandInvoker`] turns a catalog entry plus arguments into a checked round trip.

mod catalog;
mod invoker;

pub use catalog::{CommandCatalog, CommandSpec};
pub use invoker::{round_trip, stringify_args, CommandInvoker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_bind_to_invokers() {
        let catalog = CommandCatalog::parse("gain g - set gain\ninfo - show information\n");
        let invokers: Vec<CommandInvoker> = catalog.iter().cloned().map(CommandInvoker::new).collect();

        assert_eq!(invokers.len(), 2);
        assert_eq!(invokers[0].name(), "gain");
        assert_eq!(invokers[1].name(), "info");
    }
}
