//! Upload session tracker
//!
//! Holds at most one [`UploadRecord`] per filename in the order the names were
//! first seen. All updates are keyed by name; a late event for a name that is no
//! longer tracked, or for an attempt that has been superseded, is a no-op.

use crate::model::file_handle::FileHandle;
use crate::model::upload_event::UploadEvent;
use crate::model::upload_record::{AttemptId, UploadRecord, UploadStatus};

#[derive(Debug, Clone, Default)]
pub struct UploadTracker {
    records: Vec<UploadRecord>,
    next_attempt: AttemptId,
}

impl UploadTracker {
    pub fn new() -> UploadTracker {
        UploadTracker::default()
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&UploadRecord> {
        self.records.iter().find(|r| r.file.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut UploadRecord> {
        self.records.iter_mut().find(|r| r.file.name == name)
    }

    fn generate_attempt(&mut self) -> AttemptId {
        self.next_attempt += 1;
        self.next_attempt
    }

    /// Replaces the record for `record.file.name` in place or appends a new one
    fn upsert(&mut self, record: UploadRecord) {
        match self.get_mut(record.name()) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Enter `Uploading` with progress 0 and return the new attempt id
    pub fn begin_upload(&mut self, file: FileHandle) -> AttemptId {
        let attempt = self.generate_attempt();
        self.upsert(UploadRecord::uploading(file, attempt));
        attempt
    }

    /// Record a file that never reaches the network as `Failed` with progress 0
    pub fn record_failure(&mut self, file: FileHandle) {
        let attempt = self.generate_attempt();
        self.upsert(UploadRecord::failed(file, attempt));
    }

    /// Returns the record only if it is uploading under the given attempt
    fn active_attempt(&mut self, name: &str, attempt: AttemptId) -> Option<&mut UploadRecord> {
        self.get_mut(name)
            .filter(|r| r.attempt == attempt && r.status.is_uploading())
    }

    /// Apply a progress tick. Values are clamped to 100 and never move backwards
    /// within one attempt. Returns true when the record changed.
    pub fn update_progress(&mut self, name: &str, attempt: AttemptId, progress: u8) -> bool {
        match self.active_attempt(name, attempt) {
            Some(record) => {
                let progress = progress.min(100);
                if progress > record.progress {
                    record.progress = progress;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Finish an attempt successfully, forcing progress to 100
    pub fn complete(&mut self, name: &str, attempt: AttemptId) -> bool {
        match self.active_attempt(name, attempt) {
            Some(record) => {
                record.status = UploadStatus::Completed;
                record.progress = 100;
                true
            }
            None => false,
        }
    }

    /// Finish an attempt with an error, keeping the last reported progress
    pub fn fail(&mut self, name: &str, attempt: AttemptId) -> bool {
        match self.active_attempt(name, attempt) {
            Some(record) => {
                record.status = UploadStatus::Failed;
                true
            }
            None => false,
        }
    }

    /// The file to re-send when `name` is in `Failed`
    pub fn retry_candidate(&self, name: &str) -> Option<FileHandle> {
        self.get(name)
            .filter(|r| r.can_retry())
            .map(|r| r.file.clone())
    }

    /// Remove the record from any state
    pub fn remove(&mut self, name: &str) -> Option<UploadRecord> {
        let pos = self.records.iter().position(|r| r.file.name == name)?;
        Some(self.records.remove(pos))
    }

    /// Route a transfer event to the matching transition
    pub fn apply(&mut self, event: &UploadEvent) -> bool {
        match event {
            UploadEvent::Progress {
                name,
                attempt,
                progress,
            } => self.update_progress(name, *attempt, *progress),
            UploadEvent::Finished {
                name,
                attempt,
                result: Ok(()),
            } => self.complete(name, *attempt),
            UploadEvent::Finished {
                name,
                attempt,
                result: Err(_),
            } => self.fail(name, *attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::error::TransferError;

    fn file(name: &str) -> FileHandle {
        FileHandle::new(format!("/tmp/{}", name), 1024)
    }

    #[test]
    fn test_begin_upload_creates_uploading_record() {
        let mut tracker = UploadTracker::new();
        tracker.begin_upload(file("a.png"));

        let record = tracker.get("a.png").unwrap();
        assert_eq!(record.status, UploadStatus::Uploading);
        assert_eq!(record.progress, 0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_same_name_resets_instead_of_duplicating() {
        let mut tracker = UploadTracker::new();
        tracker.begin_upload(file("a.png"));
        tracker.begin_upload(file("b.png"));
        let attempt = tracker.begin_upload(file("a.png"));
        tracker.update_progress("a.png", attempt, 40);
        tracker.record_failure(file("a.png"));

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.records()[0].name(), "a.png");
        assert_eq!(tracker.records()[1].name(), "b.png");
        let record = tracker.get("a.png").unwrap();
        assert_eq!(record.status, UploadStatus::Failed);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));

        assert!(tracker.update_progress("a.png", attempt, 30));
        assert!(!tracker.update_progress("a.png", attempt, 10));
        assert_eq!(tracker.get("a.png").unwrap().progress, 30);

        assert!(tracker.update_progress("a.png", attempt, 250));
        assert_eq!(tracker.get("a.png").unwrap().progress, 100);
    }

    #[test]
    fn test_complete_forces_progress_to_100() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));
        tracker.update_progress("a.png", attempt, 42);

        assert!(tracker.complete("a.png", attempt));
        let record = tracker.get("a.png").unwrap();
        assert_eq!(record.status, UploadStatus::Completed);
        assert_eq!(record.progress, 100);
    }

    #[test]
    fn test_fail_keeps_last_progress() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));
        tracker.update_progress("a.png", attempt, 42);

        assert!(tracker.fail("a.png", attempt));
        let record = tracker.get("a.png").unwrap();
        assert_eq!(record.status, UploadStatus::Failed);
        assert_eq!(record.progress, 42);
    }

    #[test]
    fn test_retry_candidate_only_for_failed() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));
        assert!(tracker.retry_candidate("a.png").is_none());

        tracker.fail("a.png", attempt);
        let candidate = tracker.retry_candidate("a.png").unwrap();
        assert_eq!(candidate.name, "a.png");

        let retry = tracker.begin_upload(candidate);
        assert_ne!(retry, attempt);
        assert_eq!(tracker.get("a.png").unwrap().status, UploadStatus::Uploading);
        assert_eq!(tracker.get("a.png").unwrap().progress, 0);

        tracker.complete("a.png", retry);
        assert!(tracker.retry_candidate("a.png").is_none());
        assert!(tracker.retry_candidate("missing.png").is_none());
    }

    #[test]
    fn test_events_after_remove_are_noops() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));
        tracker.begin_upload(file("b.png"));

        let removed = tracker.remove("a.png").unwrap();
        assert_eq!(removed.name(), "a.png");
        assert!(tracker.remove("a.png").is_none());

        assert!(!tracker.update_progress("a.png", attempt, 50));
        assert!(!tracker.complete("a.png", attempt));
        assert!(tracker.get("a.png").is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_stale_attempt_does_not_touch_new_record() {
        let mut tracker = UploadTracker::new();
        let old = tracker.begin_upload(file("a.png"));
        tracker.remove("a.png");
        let new = tracker.begin_upload(file("a.png"));

        assert!(!tracker.update_progress("a.png", old, 90));
        assert!(!tracker.fail("a.png", old));
        let record = tracker.get("a.png").unwrap();
        assert_eq!(record.attempt, new);
        assert_eq!(record.progress, 0);
        assert_eq!(record.status, UploadStatus::Uploading);
    }

    #[test]
    fn test_updates_are_keyed_not_positional() {
        let mut tracker = UploadTracker::new();
        let a = tracker.begin_upload(file("a.png"));
        let b = tracker.begin_upload(file("b.png"));

        tracker.complete("b.png", b);
        tracker.update_progress("a.png", a, 55);

        assert_eq!(tracker.get("a.png").unwrap().progress, 55);
        assert_eq!(tracker.get("a.png").unwrap().status, UploadStatus::Uploading);
        assert_eq!(tracker.get("b.png").unwrap().status, UploadStatus::Completed);
    }

    #[test]
    fn test_apply_routes_events() {
        let mut tracker = UploadTracker::new();
        let attempt = tracker.begin_upload(file("a.png"));

        tracker.apply(&UploadEvent::Progress {
            name: "a.png".into(),
            attempt,
            progress: 20,
        });
        assert_eq!(tracker.get("a.png").unwrap().progress, 20);

        tracker.apply(&UploadEvent::Finished {
            name: "a.png".into(),
            attempt,
            result: Err(TransferError::Status(500)),
        });
        assert_eq!(tracker.get("a.png").unwrap().status, UploadStatus::Failed);

        // terminal records ignore further events of the same attempt
        assert!(!tracker.apply(&UploadEvent::Finished {
            name: "a.png".into(),
            attempt,
            result: Ok(()),
        }));
        assert_eq!(tracker.get("a.png").unwrap().status, UploadStatus::Failed);
    }
}
