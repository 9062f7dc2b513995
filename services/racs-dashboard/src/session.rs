//! Tokio driver for a [`LogTail`]

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::LogSource;
use crate::app::LogSession;
use crate::log_tail::{
    fetch_timeout, lock, new_tail_handle, Completion, FetchRequest, TailHandle,
};
use crate::model::is_terminal_state;

/// How often [`follow_log`] checks the tail for new text
const FOLLOW_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// A running poll loop bound to one subject
///
/// Dropping the session stops it.
#[derive(Debug)]
pub struct PollingSession {
    tail: TailHandle,
    cancel: CancellationToken,
}

impl PollingSession {
    /// Bind `tail` to `subject`, fetch immediately, then once per
    /// `interval` until stopped.
    pub fn start(
        tail: TailHandle,
        subject: &str,
        source: Arc<dyn LogSource>,
        interval: Duration,
    ) -> Self {
        let first = lock(&tail).bind(subject);
        tracing::info!("Tailing log of '{}' every {:?}", subject, interval);

        let timeout = fetch_timeout(interval);
        spawn_fetch(Arc::clone(&tail), Arc::clone(&source), first, timeout);

        let cancel = CancellationToken::new();
        let loop_tail = Arc::clone(&tail);
        let loop_cancel = cancel.clone();
        let subject = subject.to_string();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let request = lock(&loop_tail).tick();
                        if let Some(request) = request {
                            spawn_fetch(
                                Arc::clone(&loop_tail),
                                Arc::clone(&source),
                                request,
                                timeout,
                            );
                        }
                    }
                    _ = loop_cancel.cancelled() => {
                        tracing::debug!("Poll loop for '{}' cancelled", subject);
                        break;
                    }
                }
            }
        });

        Self { tail, cancel }
    }

    pub fn tail(&self) -> &TailHandle {
        &self.tail
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the timer and unbind the tail. A request already in flight is
    /// not aborted; its response is discarded on arrival.
    pub fn stop(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        lock(&self.tail).unbind();
    }
}

impl LogSession for PollingSession {
    fn stop(&mut self) {
        PollingSession::stop(self);
    }

    fn is_running(&self) -> bool {
        PollingSession::is_running(self)
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_fetch(
    tail: TailHandle,
    source: Arc<dyn LogSource>,
    request: FetchRequest,
    timeout: Duration,
) {
    tokio::spawn(async move {
        let fetch = source.fetch(&request.subject, request.offset);
        let result = match tokio::time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(crate::DashboardError::Http(format!(
                "log fetch for '{}' at offset {} timed out after {:?}",
                request.subject, request.offset, timeout
            ))),
        };
        let outcome = lock(&tail).complete(request.seq, result);
        if let Completion::Applied { bytes } = outcome {
            if bytes > 0 {
                tracing::debug!(
                    "Appended {} byte(s) to log of '{}'",
                    bytes,
                    request.subject
                );
            }
        }
    });
}

/// Tail `subject` and copy new log text to `out` as it arrives.
///
/// Returns when `cancel` fires or, with `exit_on_finish`, once the server
/// reports a terminal task state and no request is outstanding.
pub async fn follow_log<W: Write>(
    source: Arc<dyn LogSource>,
    subject: &str,
    interval: Duration,
    exit_on_finish: bool,
    out: &mut W,
    cancel: CancellationToken,
) -> crate::Result<()> {
    let tail = new_tail_handle();
    let session = PollingSession::start(Arc::clone(&tail), subject, source, interval);
    let mut ticker = tokio::time::interval(FOLLOW_CHECK_INTERVAL);
    let mut printed = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Stopped following '{}'", subject);
                break;
            }
        }

        let (fresh, finished) = {
            let tail = lock(&tail);
            let fresh = tail.text()[printed..].to_string();
            printed = tail.text().len();
            let finished = exit_on_finish
                && !tail.in_flight()
                && tail.task_state().is_some_and(is_terminal_state);
            (fresh, finished)
        };
        if !fresh.is_empty() {
            out.write_all(fresh.as_bytes())?;
            out.flush()?;
        }
        if finished {
            tracing::info!("Task '{}' finished", subject);
            break;
        }
    }

    session.stop();
    Ok(())
}
