//! This module provides functionality for keeping the application state
use crate::model::tracker::UploadTracker;
use crate::settings::upload_config::UploadConfig;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActivePage {
    #[default]
    Uploader,
    Help,
}

/// Represents entire state of the application, each page transforms this information for
/// suitable Props object
#[derive(Debug, Clone, Default)]
pub struct State {
    pub active_page: ActivePage,
    pub tracker: UploadTracker,
    /// Accepted extensions in allow-list order, e.g. `[".png", ".jpg"]`
    pub accepted_extensions: Vec<String>,
    pub max_size_mb: u64,
    pub endpoint: String,
}

impl State {
    pub fn new(config: &UploadConfig) -> State {
        State {
            accepted_extensions: config.formats.extensions(),
            max_size_mb: config.max_size_mb,
            endpoint: config.endpoint.clone(),
            ..State::default()
        }
    }

    pub fn set_active_page(&mut self, page: ActivePage) {
        self.active_page = page;
    }

    /// Hint shown in the drop zone, e.g. `.PNG or .JPG`
    pub fn accepted_extensions_label(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|ext| ext.to_uppercase())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
