//! Drop/selection handling and the upload, retry and delete operations.
//!
//! The session never owns the tracker: callers pass it in, so every mutation
//! happens on the task that owns the state. Transfers run on spawned tasks and
//! report back through [`UploadEvent`]s which the owner applies with
//! [`UploadTracker::apply`].

use crate::model::error::ValidationError;
use crate::model::file_handle::FileHandle;
use crate::model::tracker::UploadTracker;
use crate::model::upload_event::UploadEvent;
use crate::model::upload_record::AttemptId;
use crate::services::picker::{FilePicker, Selection};
use crate::services::task_registry::TaskRegistry;
use crate::services::upload_client::{ProgressFn, UploadTransport};
use crate::services::validator::validate;
use crate::settings::upload_config::{AcceptedFormats, UploadConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub struct UploadSession {
    transport: Arc<dyn UploadTransport>,
    picker: FilePicker,
    formats: AcceptedFormats,
    max_size_bytes: u64,
    registry: TaskRegistry,
    event_tx: UnboundedSender<UploadEvent>,
}

impl UploadSession {
    pub fn new(
        config: &UploadConfig,
        transport: Arc<dyn UploadTransport>,
        event_tx: UnboundedSender<UploadEvent>,
    ) -> Self {
        UploadSession {
            transport,
            picker: FilePicker::new(config.formats.clone(), config.max_size_bytes(), config.multiple),
            formats: config.formats.clone(),
            max_size_bytes: config.max_size_bytes(),
            registry: TaskRegistry::new(),
            event_tx,
        }
    }

    /// Pick the dropped paths and handle the resulting selection
    pub async fn handle_drop(&self, tracker: &mut UploadTracker, paths: Vec<PathBuf>) {
        let selection = self.picker.pick(paths).await;
        self.handle_selection(tracker, selection).await;
    }

    /// Accepted files are validated and uploaded one by one; rejected files are
    /// recorded as failed without validation.
    pub async fn handle_selection(&self, tracker: &mut UploadTracker, selection: Selection) {
        for file in selection.accepted {
            self.handle_upload(tracker, file).await;
        }
        for rejection in selection.rejected {
            tracing::info!("Rejected {}: {}", rejection.file.name, rejection.reason);
            tracker.record_failure(rejection.file);
        }
    }

    /// Validate `file` and, if it passes, start a transfer.
    ///
    /// Files of a type outside the allow-list are dropped without a record.
    /// Oversized files get a failed record and never reach the network.
    pub async fn handle_upload(&self, tracker: &mut UploadTracker, file: FileHandle) -> Option<AttemptId> {
        match validate(&file, &self.formats, self.max_size_bytes) {
            Err(err @ ValidationError::UnsupportedType(_)) => {
                tracing::info!("Ignoring {}: {}", file.name, err);
                None
            }
            Err(err @ ValidationError::TooLarge { .. }) => {
                tracing::info!("Not uploading {}: {}", file.name, err);
                tracker.record_failure(file);
                None
            }
            Ok(()) => {
                let attempt = tracker.begin_upload(file.clone());
                self.spawn_upload(file, attempt).await;
                Some(attempt)
            }
        }
    }

    /// Re-run the upload of a failed record. Returns false when `name` is not failed.
    pub async fn retry(&self, tracker: &mut UploadTracker, name: &str) -> bool {
        match tracker.retry_candidate(name) {
            Some(file) => {
                tracing::info!("Retrying upload of {}", name);
                self.handle_upload(tracker, file).await;
                true
            }
            None => false,
        }
    }

    /// Remove the record right away and ask the server to delete the file.
    /// An in-flight transfer is not aborted; its late events find no record.
    pub async fn delete(&self, tracker: &mut UploadTracker, name: &str) -> bool {
        if tracker.remove(name).is_none() {
            return false;
        }

        let transport = self.transport.clone();
        let filename = name.to_string();
        self.registry
            .spawn_tracked(format!("delete {}", name), async move {
                match transport.delete(filename.clone()).await {
                    Ok(()) => tracing::info!("Deleted {} on the server", filename),
                    Err(e) => tracing::warn!("Error deleting file {}: {}", filename, e),
                }
            })
            .await;
        true
    }

    async fn spawn_upload(&self, file: FileHandle, attempt: AttemptId) {
        let transport = self.transport.clone();
        let event_tx = self.event_tx.clone();
        let name = file.name.clone();

        let progress_tx = event_tx.clone();
        let progress_name = name.clone();
        let on_progress: ProgressFn = Arc::new(move |progress| {
            let _ = progress_tx.send(UploadEvent::Progress {
                name: progress_name.clone(),
                attempt,
                progress,
            });
        });

        self.registry
            .spawn_tracked(format!("upload {}", name), async move {
                let result = transport.upload(file, on_progress).await;
                match &result {
                    Ok(()) => tracing::info!("Uploaded {}", name),
                    Err(e) => tracing::warn!("Upload of {} failed: {}", name, e),
                }
                let _ = event_tx.send(UploadEvent::Finished {
                    name,
                    attempt,
                    result,
                });
            })
            .await;
    }

    /// Number of transfers and deletes still running
    pub async fn pending_tasks(&self) -> usize {
        self.registry.active_count().await
    }

    /// Abort everything still running
    pub async fn shutdown(&self) {
        for task in self.registry.active_tasks().await {
            tracing::info!("Aborting unfinished task: {}", task.name);
        }
        self.registry.cancel_all().await;
    }
}
