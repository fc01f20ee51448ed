//! Background capture of the engine's stderr.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::observe::SessionObserver;

/// Unbounded queue of trimmed stderr lines.
///
/// The drain task appends; callers take everything captured so far.
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct StderrQueue {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl StderrQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one line.
    pub fn push(&self, line: impl Into<String>) {
        self.lock().push_back(line.into());
    }

    /// Take every captured line, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.lock().drain(..).collect()
    }

    /// Take every captured line joined by newlines.
    pub fn drain_text(&self) -> String {
        self.drain().join("\n")
    }

    /// Number of lines waiting.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no lines are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Task reading the engine's stderr into a [`StderrQueue`].
///
/// Runs until end-of-stream. A read error ends the task quietly; the queue
/// keeps whatever was captured before it. The reader is moved into the
/// task, so a second drain over the same pipe cannot be started.
#[derive(Debug)]
pub struct StderrDrain {
    handle: JoinHandle<()>,
}

impl StderrDrain {
    /// Spawn the drain task. Must be called within a tokio runtime.
    pub fn start<R>(
        stderr: R,
        queue: StderrQueue,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(drain_loop(stderr, queue, observer));
        Self { handle }
    }

    /// Whether the task has stopped (stderr closed or failed).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to reach end-of-stream.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

async fn drain_loop<R>(stderr: R, queue: StderrQueue, observer: Option<Arc<dyn SessionObserver>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim().to_string();
                tracing::debug!(line = %line, "engine stderr");
                if let Some(ref obs) = observer {
                    obs.on_stderr_line(&line);
                }
                queue.push(line);
            }
            Err(e) => {
                tracing::debug!("stderr drain stopped: {}", e);
                break;
            }
        }
    }
}
