//! One upload request: decode parts, stream each to disk, join on all of them.
//!
//! Every file part gets its own pipeline task (`ProgressStream` into the
//! sink) fed through a bounded channel, so decoding advances only as fast as
//! the slowest write allows. The session resolves after the decoder reported
//! the end of the body and every part reached a terminal state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::{header, HeaderMap};
use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::UploadError;
use crate::models::{PartSummary, UploadSummary};
use crate::notifier::Notifier;
use crate::sink::write_part_counted;
use crate::throttle::{PartStatus, ProgressStream};
use crate::utils::sanitize_filename;

/// chunks buffered between the decoder and a part's writer
const PART_CHANNEL_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Streaming,
    Completed,
    Failed,
}

/// terminal state of one part after the join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub filename: String,
    pub status: PartStatus,
    pub bytes: u64,
}

/// what a part's pipeline left behind: bytes on disk plus how it ended
struct PartOutcome {
    written: u64,
    result: Result<(), UploadError>,
}

impl PartOutcome {
    fn failed(filename: &str, reason: String) -> Self {
        Self {
            written: 0,
            result: Err(UploadError::io(filename, std::io::Error::other(reason))),
        }
    }
}

struct PendingPart {
    filename: String,
    handle: Option<JoinHandle<PartOutcome>>,
    outcome: Option<PartOutcome>,
}

impl PendingPart {
    async fn settle(&mut self) {
        if let Some(handle) = self.handle.take() {
            let outcome = handle.await.unwrap_or_else(|e| {
                PartOutcome::failed(&self.filename, format!("part pipeline panicked: {e}"))
            });
            self.outcome = Some(outcome);
        }
    }
}

pub struct UploadSession {
    destination_dir: PathBuf,
    session_id: String,
    notifier: Notifier,
    delay: Duration,
    status: SessionStatus,
    parts: Vec<PartRecord>,
}

impl UploadSession {
    pub fn new(
        destination_dir: impl Into<PathBuf>,
        session_id: impl Into<String>,
        notifier: Notifier,
        delay: Duration,
    ) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            session_id: session_id.into(),
            notifier,
            delay,
            status: SessionStatus::Pending,
            parts: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// parts in discovery order, filled in once the session has joined
    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    /// Stream a `multipart/form-data` body into the destination directory.
    ///
    /// A malformed body fails before any file is opened. A failing part does
    /// not stop its siblings; the session reports failure after all of them
    /// finished.
    pub async fn begin<S, E>(
        &mut self,
        headers: &HeaderMap,
        body: S,
    ) -> Result<UploadSummary, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let boundary = multer::parse_boundary(content_type).map_err(|e| {
            tracing::warn!("Rejecting upload for session {}: {}", self.session_id, e);
            self.status = SessionStatus::Failed;
            UploadError::Decode(e)
        })?;

        tracing::debug!("Session {} streaming into {:?}", self.session_id, self.destination_dir);
        self.status = SessionStatus::Streaming;

        let mut multipart = multer::Multipart::new(body, boundary);
        let mut pending: Vec<PendingPart> = Vec::new();
        let decoded = self.decode_parts(&mut multipart, &mut pending).await;

        // join: every part reaches a terminal state before anything is reported
        for part in &mut pending {
            part.settle().await;
        }

        let mut files = Vec::new();
        let mut failed = Vec::new();
        for part in pending {
            let PartOutcome { written: bytes, result } = part.outcome.unwrap_or_else(|| {
                PartOutcome::failed(&part.filename, "part never reached a terminal state".to_string())
            });
            match result {
                Ok(()) => {
                    tracing::info!("✅ Uploaded file: {} ({} bytes)", part.filename, bytes);
                    self.parts.push(PartRecord {
                        filename: part.filename.clone(),
                        status: PartStatus::Done,
                        bytes,
                    });
                    files.push(PartSummary {
                        filename: part.filename,
                        bytes,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to upload {} after {} bytes: {}",
                        part.filename,
                        bytes,
                        e
                    );
                    self.parts.push(PartRecord {
                        filename: part.filename.clone(),
                        status: PartStatus::Errored,
                        bytes,
                    });
                    failed.push(part.filename);
                }
            }
        }

        if let Err(e) = decoded {
            tracing::warn!("Session {} aborted while decoding: {}", self.session_id, e);
            self.status = SessionStatus::Failed;
            return Err(e);
        }

        if !failed.is_empty() {
            self.status = SessionStatus::Failed;
            return Err(UploadError::PartsFailed { failed });
        }

        self.status = SessionStatus::Completed;
        tracing::info!(
            "Session {} finished: {} file(s)",
            self.session_id,
            files.len()
        );
        Ok(UploadSummary { files })
    }

    async fn decode_parts(
        &self,
        multipart: &mut multer::Multipart<'static>,
        pending: &mut Vec<PendingPart>,
    ) -> Result<(), UploadError> {
        while let Some(mut field) = multipart.next_field().await? {
            let Some(filename) = field.file_name().map(str::to_owned) else {
                tracing::trace!("Skipping non-file field {:?}", field.name());
                while field.chunk().await?.is_some() {}
                continue;
            };

            tracing::debug!("Receiving file: {}", filename);

            // one open writer per destination within a session
            let target = sanitize_filename(&filename);
            for earlier in pending
                .iter_mut()
                .filter(|p| p.handle.is_some() && sanitize_filename(&p.filename) == target)
            {
                earlier.settle().await;
            }

            let (tx, rx) = mpsc::channel(PART_CHANNEL_CAPACITY);
            let handle = tokio::spawn(run_pipeline(
                self.destination_dir.clone(),
                filename.clone(),
                self.session_id.clone(),
                self.notifier.clone(),
                self.delay,
                rx,
            ));
            pending.push(PendingPart {
                filename: filename.clone(),
                handle: Some(handle),
                outcome: None,
            });

            let mut writer_alive = true;
            loop {
                match field.chunk().await {
                    Ok(Some(chunk)) => {
                        if writer_alive && tx.send(Ok(chunk)).await.is_err() {
                            // the writer failed; keep draining so later parts still decode
                            tracing::debug!("Writer for {} is gone, draining", filename);
                            writer_alive = false;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        if writer_alive {
                            let _ = tx
                                .send(Err(std::io::Error::other(format!("request aborted: {e}"))))
                                .await;
                        }
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(())
    }
}

async fn run_pipeline(
    dir: PathBuf,
    filename: String,
    session_id: String,
    notifier: Notifier,
    delay: Duration,
    rx: mpsc::Receiver<Result<Bytes, std::io::Error>>,
) -> PartOutcome {
    let source = ProgressStream::new(ReceiverStream::new(rx), filename.clone(), session_id, notifier, delay);
    let mut written = 0;
    let result = write_part_counted(&dir, &filename, source, &mut written).await;
    PartOutcome { written, result }
}
