use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs;

use crate::error::ListingError;
use crate::models::FileStatus;
use crate::utils::format_size;

/// status of every regular file in `dir`, in enumeration order
pub async fn files_status(dir: &Path, owner: &str) -> Result<Vec<FileStatus>, ListingError> {
    tracing::debug!("Listing files in directory: {:?}", dir);
    let listing_error = |source| ListingError {
        path: dir.display().to_string(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        tracing::error!("Failed to read directory {:?}: {}", dir, e);
        listing_error(e)
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                // removed between read_dir and stat
                tracing::warn!("Skipping {:?}: {}", entry.file_name(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        files.push(FileStatus {
            size: format_size(metadata.len()),
            last_modified: format_timestamp(created),
            owner: owner.to_string(),
            file: entry.file_name().to_string_lossy().to_string(),
        });
    }

    tracing::debug!("Found {} files total", files.len());
    Ok(files)
}

/// ISO-8601 with millisecond precision, e.g. `2021-09-07T14:32:24.031Z`
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}
