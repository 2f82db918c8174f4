use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::UploadError;
use crate::utils::sanitize_filename;

/// resolve the on-disk path of an uploaded file inside `dir`
pub fn destination_path(dir: &Path, filename: &str) -> Result<PathBuf, UploadError> {
    let sanitized = sanitize_filename(filename);
    if sanitized.is_empty() {
        return Err(UploadError::io(
            filename,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty filename"),
        ));
    }
    Ok(dir.join(sanitized))
}

/// Write every chunk of `stream` to `dir/filename`, replacing any existing file.
///
/// Returns the number of bytes written. The file handle is closed on every
/// exit path; whatever was written before a failure stays on disk.
pub async fn write_part<S, E>(dir: &Path, filename: &str, stream: S) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut written = 0;
    write_part_counted(dir, filename, stream, &mut written).await?;
    Ok(written)
}

/// Same as [`write_part`], but `written` tracks the bytes on disk even when
/// the write fails part way.
pub async fn write_part_counted<S, E>(
    dir: &Path,
    filename: &str,
    mut stream: S,
    written: &mut u64,
) -> Result<(), UploadError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    *written = 0;
    let file_path = destination_path(dir, filename)?;
    tracing::trace!("Target path: {:?}", file_path);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        tracing::error!("Failed to create file {}: {}", filename, e);
        UploadError::io(filename, e)
    })?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!("Upstream aborted while receiving {} after {} bytes", filename, written);
            UploadError::io(filename, std::io::Error::other(e))
        })?;

        file.write_all(&chunk).await.map_err(|e| {
            tracing::error!("Failed to write to file {}: {}", filename, e);
            UploadError::io(filename, e)
        })?;
        *written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| UploadError::io(filename, e))?;
    file.sync_all().await.map_err(|e| {
        tracing::error!("Failed to sync file {}: {}", filename, e);
        UploadError::io(filename, e)
    })?;

    Ok(())
}
