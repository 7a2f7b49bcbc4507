//! Staged uploads: the uploaded file held in the scratch directory
//!
//! A [`StagedUpload`] owns a `NamedTempFile`, so the file is removed when
//! the value is dropped. That covers every exit from the request: success,
//! early error return, panic unwinding, and the request future being
//! dropped on timeout or client disconnect.

use super::error::IngestError;
use super::parser::UploadFormat;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub struct StagedUpload {
    file: NamedTempFile,
    writer: tokio::fs::File,
    original_name: String,
    format: UploadFormat,
    size: u64,
    max_bytes: u64,
}

impl StagedUpload {
    /// Validate the declared type and open a scratch file for it
    ///
    /// Fails with `UnsupportedFormat` before anything touches the disk.
    pub fn create(
        uploads_dir: &Path,
        original_name: Option<&str>,
        content_type: Option<&str>,
        max_bytes: u64,
    ) -> Result<Self, IngestError> {
        let format = UploadFormat::detect(original_name, content_type).ok_or_else(|| {
            IngestError::UnsupportedFormat(
                original_name
                    .or(content_type)
                    .unwrap_or("unknown")
                    .to_string(),
            )
        })?;

        // Timestamp prefix + original extension, e.g. 1718000000000-k3Jd.csv
        let prefix = format!("{}-", chrono::Utc::now().timestamp_millis());
        let suffix = format!(".{}", format.extension());
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(uploads_dir)?;

        let writer = tokio::fs::File::from_std(file.as_file().try_clone()?);

        debug!(path = %file.path().display(), "Staged upload created");

        Ok(Self {
            file,
            writer,
            original_name: original_name.unwrap_or_default().to_string(),
            format,
            size: 0,
            max_bytes,
        })
    }

    /// Stage a complete in-memory upload
    pub async fn from_bytes(
        uploads_dir: &Path,
        original_name: Option<&str>,
        content_type: Option<&str>,
        max_bytes: u64,
        bytes: &[u8],
    ) -> Result<Self, IngestError> {
        let mut staged = Self::create(uploads_dir, original_name, content_type, max_bytes)?;
        staged.write_chunk(bytes).await?;
        staged.finish().await?;
        Ok(staged)
    }

    /// Append a chunk, enforcing the size ceiling before writing it
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), IngestError> {
        let new_size = self.size + chunk.len() as u64;
        if new_size > self.max_bytes {
            return Err(IngestError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }

        self.writer.write_all(chunk).await?;
        self.size = new_size;
        Ok(())
    }

    /// Flush buffered writes so the file can be read back
    pub async fn finish(&mut self) -> Result<(), IngestError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the staged file back from storage
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }

    pub fn format(&self) -> UploadFormat {
        self.format
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Remove the staged file now, logging (not returning) any failure
    ///
    /// Dropping has the same effect but swallows errors silently.
    pub fn remove(self) {
        let path = self.path();
        drop(self.writer);
        match self.file.close() {
            Ok(()) => debug!(path = %path.display(), "Staged upload removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged upload"),
        }
    }
}

/// Remove files left in the scratch directory by an earlier process
///
/// Drop guards do not run when the process is killed. Call once at startup,
/// before requests are accepted. Returns how many files were removed.
pub fn purge_stale_uploads(uploads_dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(uploads_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl std::fmt::Debug for StagedUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedUpload")
            .field("path", &self.file.path())
            .field("original_name", &self.original_name)
            .field("format", &self.format)
            .field("size", &self.size)
            .finish()
    }
}
