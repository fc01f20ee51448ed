//! Test utilities for libliquidsfz integration tests.
//!
//! The real engine needs audio hardware, so these tests drive a small
//! POSIX shell script that speaks the same prompt protocol.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use libliquidsfz::{SessionBuilder, SessionObserver};
use tempfile::TempDir;

/// Help text printed by the fake engine, one command per line.
const HELP: &[(&str, &str)] = &[
    ("help", "show help"),
    ("quit", "quit liquidsfz"),
    ("info", "show information"),
    ("max_voices n", "set maximum number of voices"),
    ("gain g", "set gain (0 <= g <= 5)"),
    ("noteon chan key vel", "start note"),
    ("warn msg", "print a warning on stderr"),
    ("slow", "answer after a delay"),
    ("crash", "exit with code 3"),
];

/// Builder for a fake liquidsfz script.
pub struct FakeEngine {
    prompt: String,
    banner: Vec<String>,
    delay_secs: u32,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            prompt: "liquidsfz> ".to_string(),
            banner: vec![
                "liquidsfz 0.3.2".to_string(),
                "Type help for a list of commands.".to_string(),
            ],
            delay_secs: 1,
        }
    }

    /// Use a different prompt. Must not contain single quotes.
    pub fn prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Replace the startup banner.
    pub fn banner(mut self, lines: &[&str]) -> Self {
        self.banner = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Seconds the `slow` command sleeps before answering.
    pub fn delay_secs(mut self, secs: u32) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Write the script into a fresh temp dir.
    pub fn install(self) -> InstalledEngine {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("fake-liquidsfz.sh");
        std::fs::write(&script, self.script()).expect("write fake engine");
        InstalledEngine { _dir: dir, script }
    }

    fn script(&self) -> String {
        let mut s = String::new();
        s.push_str("set -f\n");
        s.push_str(&format!("P='{}'\n", self.prompt));
        s.push_str("SFZ=\"$1\"\n");
        for line in &self.banner {
            s.push_str(&format!("echo '{}'\n", line));
        }
        s.push_str("printf '%s' \"$P\"\n");
        s.push_str("while IFS= read -r line; do\n");
        s.push_str("  set -- $line\n");
        s.push_str("  cmd=\"$1\"\n");
        s.push_str("  [ $# -gt 0 ] && shift\n");
        s.push_str("  case \"$cmd\" in\n");
        s.push_str("    help)\n");
        for (usage, description) in HELP {
            s.push_str(&format!("      echo '{:<24}- {}'\n", usage, description));
        }
        s.push_str("      ;;\n");
        s.push_str("    quit) exit 0 ;;\n");
        s.push_str("    info)\n");
        s.push_str("      echo \"preset: $SFZ\"\n");
        s.push_str("      echo \"mark: $FAKE_MARK\"\n");
        s.push_str("      ;;\n");
        s.push_str("    max_voices) echo \"max_voices set to $1\" ;;\n");
        s.push_str("    warn) echo \"warning: $*\" >&2 ;;\n");
        s.push_str(&format!(
            "    slow) echo 'slow: started' >&2; sleep {}; echo 'slow done' ;;\n",
            self.delay_secs
        ));
        s.push_str("    crash) echo 'fatal: crashing' >&2; exit 3 ;;\n");
        s.push_str("    *) echo \"$cmd $*\" ;;\n");
        s.push_str("  esac\n");
        s.push_str("  printf '%s' \"$P\"\n");
        s.push_str("done\n");
        s
    }
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A fake engine script on disk. The directory is removed on drop.
pub struct InstalledEngine {
    _dir: TempDir,
    script: PathBuf,
}

impl InstalledEngine {
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Session builder running the script through `sh`.
    pub fn session(&self) -> SessionBuilder {
        libliquidsfz::Session::builder()
            .engine_path("sh")
            .arg(self.script.display().to_string())
    }
}

/// Observer that records every event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub commands: Mutex<Vec<String>>,
    pub responses: Mutex<Vec<(String, String)>>,
    pub stderr: Mutex<Vec<String>>,
    pub terminated: Mutex<Vec<Option<i32>>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<(String, String)> {
        self.responses.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<Option<i32>> {
        self.terminated.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_command(&self, line: &str) {
        self.commands.lock().unwrap().push(line.to_string());
    }

    fn on_response(&self, command: &str, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((command.to_string(), response.to_string()));
    }

    fn on_stderr_line(&self, line: &str) {
        self.stderr.lock().unwrap().push(line.to_string());
    }

    fn on_terminated(&self, exit_code: Option<i32>) {
        self.terminated.lock().unwrap().push(exit_code);
    }
}
