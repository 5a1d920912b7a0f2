//! One-shot TCP transport for Pmon commands.
//!
//! Every command opens a fresh connection, writes the framed command plus a
//! newline, and reads until the reply is done. There is no connection
//! pooling and no retry: one call, one socket, one reply. Concurrent calls
//! open independent sockets.
//!
//! ## Completion and salvage
//!
//! Reply accumulation is an explicit little state machine
//! ([`ResponseAccumulator`]) driven by three events:
//!
//! - a received chunk completes the reply when the codec's heuristic
//!   matches ([`crate::codec::is_response_complete`]);
//! - peer close (EOF) finishes the reply with whatever was accumulated, or
//!   fails if nothing arrived (some Pmon replies carry no terminator and
//!   complete only by close);
//! - the per-call deadline finishes the reply with whatever was
//!   accumulated, or fails with a timeout if nothing arrived.
//!
//! Salvaging partial data on deadline expiry is deliberate and
//! load-bearing: slow replies that are complete enough to parse must keep
//! working. Only the zero-byte cases are errors. Socket errors abort
//! immediately regardless of accumulated data.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::codec::is_response_complete;
use crate::error::PmonError;

/// Terminal states of an accumulation that ended without the completion
/// heuristic matching.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionOutcome {
    /// Data had arrived; the accumulated buffer is returned as the reply.
    Salvaged(String),
    /// The peer closed the connection before sending anything.
    ClosedEmpty,
    /// The deadline fired before anything arrived.
    TimedOutEmpty,
}

/// Accumulates reply chunks and decides when the reply is finished.
///
/// Pure and socket-free so the chunk/EOF/deadline interplay is testable
/// with fabricated event sequences.
#[derive(Debug, Default)]
struct ResponseAccumulator {
    buf: String,
}

impl ResponseAccumulator {
    fn new() -> Self {
        Self::default()
    }

    /// Feed one received chunk. Returns the full reply once the completion
    /// heuristic matches. Invalid UTF-8 is replaced, not fatal.
    fn on_chunk(&mut self, data: &[u8]) -> Option<String> {
        self.buf.push_str(&String::from_utf8_lossy(data));
        if is_response_complete(&self.buf) {
            Some(std::mem::take(&mut self.buf))
        } else {
            None
        }
    }

    /// The peer closed the connection before completion was detected.
    fn on_eof(self) -> SessionOutcome {
        if self.buf.is_empty() {
            SessionOutcome::ClosedEmpty
        } else {
            SessionOutcome::Salvaged(self.buf)
        }
    }

    /// The per-call deadline fired before completion was detected.
    fn on_timeout(self) -> SessionOutcome {
        if self.buf.is_empty() {
            SessionOutcome::TimedOutEmpty
        } else {
            SessionOutcome::Salvaged(self.buf)
        }
    }
}

/// Send one framed command and return the raw reply text.
///
/// Connect, write, and the whole read phase share a single deadline of
/// `timeout_ms` milliseconds. The newline terminator is appended here;
/// callers pass the bare command from [`crate::codec::build_command`].
pub async fn send_command(
    host: &str,
    port: u16,
    command: &str,
    timeout_ms: u64,
) -> Result<String, PmonError> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let addr = format!("{host}:{port}");

    // The command text carries the auth prefix, so it never goes to the log.
    debug!("Opening Pmon connection to {addr}");
    let mut stream = match timeout_at(deadline, TcpStream::connect((host, port))).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            return Err(PmonError::Connection(format!(
                "Failed to connect to Pmon at {addr}: {e}"
            )))
        }
        Err(_) => return Err(timeout_error(&addr, timeout_ms)),
    };

    let frame = format!("{command}\n");
    match timeout_at(deadline, stream.write_all(frame.as_bytes())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(PmonError::Connection(format!(
                "Failed to send command to Pmon at {addr}: {e}"
            )))
        }
        Err(_) => return Err(timeout_error(&addr, timeout_ms)),
    }

    let mut acc = ResponseAccumulator::new();
    let mut chunk = [0u8; 4096];
    loop {
        match timeout_at(deadline, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                return match acc.on_eof() {
                    SessionOutcome::Salvaged(text) => {
                        debug!("Pmon at {addr} closed the reply without a terminator ({} bytes)", text.len());
                        Ok(text)
                    }
                    _ => Err(PmonError::Connection(format!(
                        "Connection to Pmon at {addr} closed before any response data"
                    ))),
                };
            }
            Ok(Ok(n)) => {
                if let Some(text) = acc.on_chunk(&chunk[..n]) {
                    debug!("Pmon reply from {addr} complete ({} bytes)", text.len());
                    return Ok(text);
                }
            }
            Ok(Err(e)) => {
                return Err(PmonError::Connection(format!(
                    "Socket error while reading from Pmon at {addr}: {e}"
                )))
            }
            Err(_) => {
                return match acc.on_timeout() {
                    SessionOutcome::Salvaged(text) => {
                        warn!(
                            "Pmon reply from {addr} timed out after {timeout_ms} ms, salvaging {} buffered bytes",
                            text.len()
                        );
                        Ok(text)
                    }
                    _ => Err(timeout_error(&addr, timeout_ms)),
                };
            }
        }
    }
}

fn timeout_error(addr: &str, timeout_ms: u64) -> PmonError {
    PmonError::Timeout(format!(
        "No response from Pmon at {addr} within {timeout_ms} ms"
    ))
}
