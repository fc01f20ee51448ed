//! Command catalog parsed from the engine's `help` output.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One line of help output: `name params... - description`.
///
/// Parameters are bare words and cannot contain a dash, so the first
/// ` - ` after them starts the description.
fn help_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\w+)\s+([^-]*?)\s*-\s+(.*?)\s*$").expect("help line pattern is valid")
    })
}

/// A command advertised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Command name as typed at the prompt.
    pub name: String,
    /// Parameter names, in order.
    pub params: Vec<String>,
    /// One-line description.
    pub description: String,
}

impl CommandSpec {
    /// Parse one help line, or `None` if it isn't a command entry.
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = help_line_pattern().captures(line)?;
        let params = caps[2]
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Some(Self {
            name: caps[1].to_string(),
            params,
            description: caps[3].to_string(),
        })
    }

    /// Number of arguments the command takes.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Every command the engine advertised, keyed by name.
///
/// Built once from the `help` response and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandCatalog {
    commands: BTreeMap<String, Arc<CommandSpec>>,
}

impl CommandCatalog {
    /// Parse a full `help` response.
    ///
    /// Lines that don't look like command entries are skipped. If a name
    /// appears twice the later line wins.
    pub fn parse(help_text: &str) -> Self {
        let mut commands = BTreeMap::new();
        for spec in help_text.lines().filter_map(CommandSpec::parse_line) {
            commands.insert(spec.name.clone(), Arc::new(spec));
        }
        Self { commands }
    }

    /// Look up a command.
    pub fn get(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        self.commands.get(name)
    }

    /// Whether the engine advertised `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandSpec>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
