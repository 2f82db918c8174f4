//! Client-side view of a batch upload.
//!
//! Mirrors what a browser client does with `file-uploaded` events: per-file
//! percentages, a displayed total, and a listing refresh once any file is
//! close enough to done. Because the server drops unannounced tail bytes,
//! waiting for 100% could wait forever; 98% is treated as finished.

use std::collections::HashMap;

use crate::models::ProgressPayload;

/// percent at which a file counts as uploaded
pub const REFRESH_THRESHOLD: u64 = 98;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFileEntry {
    pub name: String,
    /// size in bytes, known before the upload starts
    pub size: u64,
    pub percent: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u64,
    /// displayed total, the plain sum of every file's percent
    pub total: u64,
    /// true when the file listing should be fetched again
    pub refresh: bool,
}

#[derive(Debug, Default)]
pub struct CompletionAggregator {
    entries: HashMap<String, ClientFileEntry>,
    displayed: u64,
}

impl CompletionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// forget the previous batch and track `files` as (name, size) pairs
    pub fn start_batch<I, N>(&mut self, files: I)
    where
        I: IntoIterator<Item = (N, u64)>,
        N: Into<String>,
    {
        self.entries.clear();
        self.displayed = 0;
        for (name, size) in files {
            let name = name.into();
            self.entries.insert(
                name.clone(),
                ClientFileEntry {
                    name,
                    size,
                    percent: None,
                },
            );
        }
    }

    /// apply one progress event; `None` for files outside the current batch
    pub fn on_progress(&mut self, event: &ProgressPayload) -> Option<ProgressUpdate> {
        let entry = self.entries.get_mut(&event.filename)?;
        let percent = percent_of(event.processed_already, entry.size);
        entry.percent = Some(percent);

        self.displayed = self.total();
        Some(ProgressUpdate {
            percent,
            total: self.displayed,
            refresh: percent >= REFRESH_THRESHOLD,
        })
    }

    /// every request of the batch returned
    pub fn finish_batch(&mut self) {
        self.displayed = 100;
    }

    pub fn displayed(&self) -> u64 {
        self.displayed
    }

    pub fn entry(&self, name: &str) -> Option<&ClientFileEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn total(&self) -> u64 {
        self.entries.values().filter_map(|e| e.percent).sum()
    }
}

// ceil(100 * processed / size)
fn percent_of(processed: u64, size: u64) -> u64 {
    if size == 0 {
        return 100;
    }
    let scaled = u128::from(processed) * 100;
    scaled.div_ceil(u128::from(size)) as u64
}
