use crate::model::state::ActivePage;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate { page: ActivePage },
    /// Paths dropped on (pasted into) or typed into the drop zone
    Drop { paths: Vec<PathBuf> },
    Retry { name: String },
    Delete { name: String },
    Exit,
}
