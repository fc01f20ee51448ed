//! I/O primitives for talking to the engine over its pipes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::LINE_TERMINATOR;
use crate::config::Prompt;
use crate::{Error, Result};

/// Splits the engine's stdout into responses using the prompt as delimiter.
///
/// The prompt is not newline-terminated, so the stream is scanned one byte
/// at a time instead of line by line. Bytes past the prompt stay buffered
/// for the next call.
pub struct ResponseFramer<R> {
    reader: BufReader<R>,
    prompt: Prompt,
}

impl<R: AsyncRead + Unpin> ResponseFramer<R> {
    /// Create a framer over a byte stream.
    pub fn new(reader: R, prompt: Prompt) -> Self {
        Self {
            reader: BufReader::new(reader),
            prompt,
        }
    }

    /// The prompt this framer is scanning for.
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Read the next response.
    ///
    /// Returns `Ok(Some(text))` with everything before the next prompt, or
    /// `Ok(None)` if the stream ended first. A partial response cut off by
    /// end-of-stream is discarded.
    ///
    /// The prompt is matched as a suffix of the current line, not only as
    /// a whole line. Output text that itself ends in the prompt string
    /// therefore ends the frame early, and whatever follows it is framed
    /// as the next response.
    pub async fn next_response(&mut self) -> Result<Option<String>> {
        let prompt = self.prompt.as_bytes();
        let mut response: Vec<u8> = Vec::new();
        let mut line: Vec<u8> = Vec::new();

        loop {
            let byte = match self.reader.read_u8().await {
                Ok(byte) => byte,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    if !response.is_empty() || !line.is_empty() {
                        tracing::debug!(
                            discarded = response.len() + line.len(),
                            "stdout closed mid-response"
                        );
                    }
                    return Ok(None);
                }
                Err(e) => return Err(Error::io(e)),
            };

            if byte == LINE_TERMINATOR {
                response.extend_from_slice(&line);
                response.push(byte);
                line.clear();
                continue;
            }

            line.push(byte);
            if line.ends_with(prompt) {
                line.truncate(line.len() - prompt.len());
                response.extend_from_slice(&line);
                let text = String::from_utf8_lossy(&response).into_owned();
                tracing::trace!(response = %text, "framed response");
                return Ok(Some(text));
            }
        }
    }
}

/// Writes newline-terminated command lines to the engine's stdin.
///
/// Every line is flushed immediately since the engine blocks reading it.
/// After the first failed write the writer is closed for good.
pub struct LineWriter<W> {
    inner: Option<W>,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Create a writer from a child process stdin.
    pub fn new(inner: W) -> Self {
        Self { inner: Some(inner) }
    }

    /// Write `line` followed by the line terminator, then flush.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(Error::PipeClosed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin already closed",
            )));
        };

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(LINE_TERMINATOR);

        let result = match inner.write_all(&buf).await {
            Ok(()) => inner.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.inner = None;
            return Err(Error::PipeClosed(e));
        }
        Ok(())
    }

    /// Whether the pipe is still usable.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Drop the pipe, signalling end-of-input to the engine.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Get the underlying writer, if still open.
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }
}
