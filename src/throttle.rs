//! Per-part progress reporting.
//!
//! Progress is chunk-driven: a chunk arriving at least `delay` after the last
//! emission triggers a new one. There is no timer, so bytes received after the
//! last qualifying chunk are never announced on their own.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use tokio::time::Instant;

use crate::models::{ProgressPayload, ServerEvent};
use crate::notifier::Notifier;

/// time gate between two emissions
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    last_emit: Instant,
}

impl Throttle {
    pub fn new(delay: Duration, now: Instant) -> Self {
        Self {
            delay,
            last_emit: now,
        }
    }

    /// true once `delay` has elapsed since the last emission, boundary included
    pub fn can_execute(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_emit) >= self.delay
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_emit = now;
    }

    pub fn last_emit(&self) -> Instant {
        self.last_emit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartStatus {
    Streaming,
    Done,
    Errored,
}

/// progress state owned by a single part's pipeline
#[derive(Debug, Clone)]
pub struct PartProgress {
    filename: String,
    processed_bytes: u64,
    throttle: Throttle,
    status: PartStatus,
}

impl PartProgress {
    pub fn new(filename: impl Into<String>, delay: Duration, now: Instant) -> Self {
        Self {
            filename: filename.into(),
            processed_bytes: 0,
            throttle: Throttle::new(delay, now),
            status: PartStatus::Streaming,
        }
    }

    /// account for a chunk of `len` bytes seen at `now`
    pub fn record(&mut self, len: usize, now: Instant) -> Option<ProgressPayload> {
        self.processed_bytes += len as u64;

        if !self.throttle.can_execute(now) {
            return None;
        }

        self.throttle.mark(now);
        Some(ProgressPayload {
            processed_already: self.processed_bytes,
            filename: self.filename.clone(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes
    }

    pub fn status(&self) -> PartStatus {
        self.status
    }

    pub fn last_emit(&self) -> Instant {
        self.throttle.last_emit()
    }

    pub fn finish(&mut self, status: PartStatus) {
        self.status = status;
    }
}

/// Stream adapter that forwards chunks untouched and reports progress for them.
pub struct ProgressStream<S> {
    inner: S,
    progress: PartProgress,
    notifier: Notifier,
    session_id: String,
}

impl<S> ProgressStream<S> {
    pub fn new(
        inner: S,
        filename: impl Into<String>,
        session_id: impl Into<String>,
        notifier: Notifier,
        delay: Duration,
    ) -> Self {
        Self {
            inner,
            progress: PartProgress::new(filename, delay, Instant::now()),
            notifier,
            session_id: session_id.into(),
        }
    }

    pub fn progress(&self) -> &PartProgress {
        &self.progress
    }
}

impl<S, E> Stream for ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(item) => item,
            Poll::Pending => return Poll::Pending,
        };

        match &item {
            Some(Ok(chunk)) => {
                if let Some(payload) = this.progress.record(chunk.len(), Instant::now()) {
                    tracing::trace!(
                        "{} processed {} bytes",
                        payload.filename,
                        payload.processed_already
                    );
                    this.notifier
                        .emit(&this.session_id, ServerEvent::Progress(payload));
                }
            }
            Some(Err(_)) => this.progress.finish(PartStatus::Errored),
            None => {
                if this.progress.status() == PartStatus::Streaming {
                    this.progress.finish(PartStatus::Done);
                }
            }
        }

        Poll::Ready(item)
    }
}
