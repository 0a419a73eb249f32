//! Per-file upload state
//!
//! A record is created when a file is dropped, mutated by progress events and
//! terminal outcomes, and removed only by an explicit delete.

use crate::model::file_handle::FileHandle;
use std::fmt;

/// Identifier of a single upload attempt for a record
pub type AttemptId = u64;

/// Lifecycle state of an upload record.
///
/// Retry is not a state of its own: it moves a `Failed` record back to `Uploading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadStatus::Uploading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UploadStatus::Failed)
    }

    /// Returns true if the upload is finished (completed or failed)
    pub fn is_finished(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Uploading => write!(f, "Uploading"),
            UploadStatus::Completed => write!(f, "Completed"),
            UploadStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Tracked state of one file's upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub file: FileHandle,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub status: UploadStatus,
    /// Attempt that currently owns this record; events from older attempts are ignored
    pub attempt: AttemptId,
}

impl UploadRecord {
    pub fn uploading(file: FileHandle, attempt: AttemptId) -> UploadRecord {
        UploadRecord {
            file,
            progress: 0,
            status: UploadStatus::Uploading,
            attempt,
        }
    }

    pub fn failed(file: FileHandle, attempt: AttemptId) -> UploadRecord {
        UploadRecord {
            file,
            progress: 0,
            status: UploadStatus::Failed,
            attempt,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    /// Retry is only offered for failed uploads
    pub fn can_retry(&self) -> bool {
        self.status.is_failed()
    }

    pub fn to_columns(&self) -> Vec<String> {
        vec![
            self.file.name.clone(),
            self.file.size_label(),
            self.status.to_string(),
            format!("{}%", self.progress),
        ]
    }
}
