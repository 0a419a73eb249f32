use crate::model::error::TransferResult;
use crate::model::upload_record::AttemptId;

/// Messages sent from running transfers back to the state store
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Bytes were handed to the transport, `progress` is a percentage
    Progress {
        name: String,
        attempt: AttemptId,
        progress: u8,
    },
    /// The transfer attempt ended
    Finished {
        name: String,
        attempt: AttemptId,
        result: TransferResult,
    },
}

impl UploadEvent {
    pub fn name(&self) -> &str {
        match self {
            UploadEvent::Progress { name, .. } => name,
            UploadEvent::Finished { name, .. } => name,
        }
    }
}
