//! Upload pipeline: stage the incoming file, place it under the storage
//! layout, then record it.
//!
//! A [`StagedUpload`] owns its file on disk until [`StagedUpload::commit`]
//! succeeds. Every other exit (an explicit [`StagedUpload::discard`], a
//! failed record insert, or simply dropping the value when a request is
//! aborted) removes the file, so storage never holds a video without a row.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::naming::{storage_dir, video_filename};
use crate::types::{DbId, Timestamp};
use crate::validation::validate_original_filename;

/// Directory under the upload root where files are written while the
/// request body is still arriving.
pub const INCOMING_DIR: &str = ".incoming";

/// Default ceiling for a single upload (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// Room the upload is filed under.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub room_id: DbId,
    pub room_number: String,
}

/// Everything needed to insert a video row once its file is in place.
#[derive(Debug, Clone)]
pub struct VideoDraft {
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub room_id: DbId,
    pub uploaded_by: DbId,
    pub upload_date: Timestamp,
    /// `{ "content_type": ..., "room_number": ... }`
    pub metadata: serde_json::Value,
}

/// Persists the metadata record for a placed upload.
#[async_trait]
pub trait VideoRecordSink: Send + Sync {
    type Record: Send;
    type Error: std::fmt::Display + Send;

    async fn insert(&self, draft: &VideoDraft) -> Result<Self::Record, Self::Error>;
}

/// Failure of [`StagedUpload::commit`]. In both cases the file is gone.
#[derive(Debug, thiserror::Error)]
pub enum CommitError<E> {
    #[error(transparent)]
    Storage(#[from] CoreError),

    #[error("Failed to record video: {0}")]
    Record(E),
}

#[derive(Debug)]
struct Placement {
    filename: String,
    target: UploadTarget,
    placed_at: Timestamp,
}

/// A file being received for upload.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    file: Option<File>,
    original_filename: String,
    content_type: Option<String>,
    bytes_written: u64,
    max_bytes: u64,
    placement: Option<Placement>,
    /// Cleared once the file belongs to a committed record (or was removed).
    armed: bool,
}

impl StagedUpload {
    /// Open a fresh file under `{upload_root}/.incoming/`.
    pub async fn begin(
        upload_root: &Path,
        original_filename: &str,
        content_type: Option<&str>,
        max_bytes: u64,
    ) -> Result<Self, CoreError> {
        validate_original_filename(original_filename)?;

        let dir = upload_root.join(INCOMING_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create incoming directory", &dir, e))?;

        let path = dir.join(format!("{}.part", Uuid::new_v4().simple()));
        let file = File::create(&path)
            .await
            .map_err(|e| io_error("create file", &path, e))?;

        Ok(Self {
            path,
            file: Some(file),
            original_filename: original_filename.to_string(),
            content_type: content_type.map(str::to_string),
            bytes_written: 0,
            max_bytes,
            placement: None,
            armed: true,
        })
    }

    /// Append a chunk of the request body.
    ///
    /// Fails with a validation error once the total would exceed the
    /// configured ceiling; nothing past the ceiling is written.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CoreError> {
        let next = self.bytes_written + chunk.len() as u64;
        if next > self.max_bytes {
            return Err(file_too_large(self.max_bytes));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CoreError::Internal("upload is no longer accepting data".into()))?;
        file.write_all(chunk)
            .await
            .map_err(|e| io_error("write file", &self.path, e))?;

        self.bytes_written = next;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Current location of the file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the file and move it to its final location for `target`.
    pub async fn place(
        &mut self,
        upload_root: &Path,
        target: UploadTarget,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        if self.placement.is_some() {
            return Err(CoreError::Internal("upload already placed".into()));
        }

        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| io_error("flush file", &self.path, e))?;
            file.sync_all()
                .await
                .map_err(|e| io_error("sync file", &self.path, e))?;
        }

        let dir = storage_dir(upload_root, now, &target.room_number);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create upload directory", &dir, e))?;

        let filename = video_filename(now, &target.room_number, &self.original_filename);
        let dest = dir.join(&filename);
        fs::rename(&self.path, &dest)
            .await
            .map_err(|e| io_error("move file into place", &dest, e))?;

        self.path = dest;
        self.placement = Some(Placement {
            filename,
            target,
            placed_at: now,
        });
        Ok(())
    }

    /// Record the placed file through `sink`.
    ///
    /// If the insert fails the file is removed before the error is returned.
    pub async fn commit<S: VideoRecordSink>(
        mut self,
        sink: &S,
        uploaded_by: DbId,
    ) -> Result<S::Record, CommitError<S::Error>> {
        let draft = match self.draft(uploaded_by) {
            Some(draft) => draft,
            None => {
                self.discard().await;
                return Err(CommitError::Storage(CoreError::Internal(
                    "upload committed before being placed".into(),
                )));
            }
        };

        match sink.insert(&draft).await {
            Ok(record) => {
                self.armed = false;
                Ok(record)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to record upload, removing stored file"
                );
                self.discard().await;
                Err(CommitError::Record(e))
            }
        }
    }

    /// Remove the file. Removal failures are logged, never returned.
    pub async fn discard(mut self) {
        self.armed = false;
        self.file.take();
        remove_file_best_effort(&self.path).await;
    }

    fn draft(&self, uploaded_by: DbId) -> Option<VideoDraft> {
        let placement = self.placement.as_ref()?;
        Some(VideoDraft {
            filename: placement.filename.clone(),
            original_filename: self.original_filename.clone(),
            file_path: self.path.to_string_lossy().to_string(),
            file_size: i64::try_from(self.bytes_written).unwrap_or(i64::MAX),
            room_id: placement.target.room_id,
            uploaded_by,
            upload_date: placement.placed_at,
            metadata: json!({
                "content_type": self.content_type.clone().unwrap_or_default(),
                "room_number": placement.target.room_number,
            }),
        })
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.file.take();
        // Drop cannot await; a single blocking unlink on the worker thread.
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed abandoned upload");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to remove abandoned upload"
                );
            }
        }
    }
}

/// Remove a stored file, logging instead of failing.
///
/// A file that is already gone counts as removed, so calling this twice is
/// harmless. Returns `true` when the file no longer exists.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "File already absent");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove file");
            false
        }
    }
}

fn file_too_large(max_bytes: u64) -> CoreError {
    CoreError::Validation(format!(
        "File too large: maximum upload size is {max_bytes} bytes"
    ))
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} '{}': {err}", path.display()))
}
