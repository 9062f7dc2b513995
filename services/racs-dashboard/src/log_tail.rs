//! Offset-tracked log tailing
//!
//! [`LogTail`] is the accumulator and state machine behind a live log view.
//! It performs no I/O: callers ask it which request to issue next
//! ([`LogTail::bind`], [`LogTail::tick`]) and hand back the outcome
//! ([`LogTail::complete`]). Drivers live in `session` (tokio) and `web`
//! (browser).
//!
//! At most one request is outstanding at a time. Every request carries a
//! sequence number that is never reused, so a response that arrives after
//! an unbind, a rebind, or a newer request is recognised as stale and
//! dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Lower bound on how long one log fetch may take
pub const MIN_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a driver lets one fetch run before reporting it failed. Failing
/// frees the in-flight slot so the next tick retries the same offset.
pub fn fetch_timeout(interval: Duration) -> Duration {
    interval.saturating_mul(5).max(MIN_FETCH_TIMEOUT)
}

/// Lifecycle of a tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    /// No subject bound yet
    Idle,
    /// Subject bound, requests flow
    Polling,
    /// Unbound; buffer kept for inspection
    Stopped,
}

impl fmt::Display for TailState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailState::Idle => write!(f, "Idle"),
            TailState::Polling => write!(f, "Polling"),
            TailState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A log fetch the driver should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub subject: String,
    pub offset: u64,
}

/// A successful log response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChunk {
    /// Raw log bytes starting at the requested offset
    pub bytes: Vec<u8>,
    /// Task state reported alongside the bytes, if any
    pub task_state: Option<String>,
}

impl LogChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            task_state: None,
        }
    }

    pub fn with_task_state(mut self, state: impl Into<String>) -> Self {
        self.task_state = Some(state.into());
        self
    }
}

/// What [`LogTail::complete`] did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Response applied; `bytes` were consumed from the stream
    Applied { bytes: usize },
    /// Request failed; offset unchanged, the next tick retries
    Failed,
    /// Response belongs to a superseded request and was dropped
    Stale,
}

/// Log accumulator bound to one subject at a time
#[derive(Debug)]
pub struct LogTail {
    state: TailState,
    subject: Option<String>,
    text: String,
    /// Trailing bytes of a multi-byte character not yet complete
    pending: Vec<u8>,
    offset: u64,
    task_state: Option<String>,
    next_seq: u64,
    in_flight: Option<u64>,
}

impl Default for LogTail {
    fn default() -> Self {
        Self::new()
    }
}

impl LogTail {
    pub fn new() -> Self {
        Self {
            state: TailState::Idle,
            subject: None,
            text: String::new(),
            pending: Vec::new(),
            offset: 0,
            task_state: None,
            next_seq: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> TailState {
        self.state
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Decoded log text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of log bytes incorporated; the next request starts here
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Latest task state reported by the server
    pub fn task_state(&self) -> Option<&str> {
        self.task_state.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Bind to `subject`, discarding any previous buffer, and return the
    /// immediate first request.
    pub fn bind(&mut self, subject: impl Into<String>) -> FetchRequest {
        let subject = subject.into();
        tracing::debug!("Binding log tail to '{}'", subject);
        self.state = TailState::Polling;
        self.subject = Some(subject);
        self.text.clear();
        self.pending.clear();
        self.offset = 0;
        self.task_state = None;
        self.in_flight = None;
        self.issue()
    }

    /// Timer tick: the next request, unless unbound or one is outstanding
    pub fn tick(&mut self) -> Option<FetchRequest> {
        if self.state != TailState::Polling {
            return None;
        }
        if let Some(seq) = self.in_flight {
            tracing::trace!("Skipping tick: request {} still outstanding", seq);
            return None;
        }
        Some(self.issue())
    }

    /// Apply the outcome of request `seq`
    pub fn complete<E: fmt::Display>(
        &mut self,
        seq: u64,
        result: Result<LogChunk, E>,
    ) -> Completion {
        if self.state != TailState::Polling || self.in_flight != Some(seq) {
            tracing::debug!("Dropping stale log response {}", seq);
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(chunk) => {
                let bytes = chunk.bytes.len();
                self.absorb(&chunk.bytes);
                if chunk.task_state.is_some() {
                    self.task_state = chunk.task_state;
                }
                tracing::trace!(
                    "Log response {}: {} byte(s), offset {}",
                    seq,
                    bytes,
                    self.offset
                );
                Completion::Applied { bytes }
            }
            Err(e) => {
                tracing::warn!(
                    "Log fetch for '{}' at offset {} failed: {}",
                    self.subject.as_deref().unwrap_or_default(),
                    self.offset,
                    e
                );
                Completion::Failed
            }
        }
    }

    /// Stop issuing requests; anything still in flight becomes stale
    pub fn unbind(&mut self) {
        if self.state == TailState::Polling {
            tracing::debug!(
                "Unbinding log tail from '{}' at offset {}",
                self.subject.as_deref().unwrap_or_default(),
                self.offset
            );
            self.state = TailState::Stopped;
        }
        self.in_flight = None;
    }

    fn issue(&mut self) -> FetchRequest {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        FetchRequest {
            seq,
            subject: self.subject.clone().unwrap_or_default(),
            offset: self.offset,
        }
    }

    /// Append raw bytes, decoding as much UTF-8 as is complete
    fn absorb(&mut self, bytes: &[u8]) {
        self.offset += bytes.len() as u64;
        self.pending.extend_from_slice(bytes);

        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = rest.to_vec();
    }
}

/// Shared handle to a tail, read by views and written by a driver
pub type TailHandle = Arc<Mutex<LogTail>>;

pub fn new_tail_handle() -> TailHandle {
    Arc::new(Mutex::new(LogTail::new()))
}

/// Lock a tail, recovering from a poisoned mutex
pub fn lock(tail: &TailHandle) -> MutexGuard<'_, LogTail> {
    tail.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
