use std::path::{Path, PathBuf};

/// Reference to a local file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Final path component, used as the record key
    pub name: String,
    pub path: PathBuf,
    /// Size in bytes at the time the file was picked
    pub size: u64,
    /// Declared media type guessed from the extension, empty when unknown
    pub media_type: String,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> FileHandle {
        let path = path.into();
        FileHandle {
            name: file_name(&path),
            media_type: declared_media_type(&path),
            size,
            path,
        }
    }

    /// Size in megabytes with a single decimal, e.g. `1.5MB`
    pub fn size_label(&self) -> String {
        format!("{:.1}MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn declared_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default()
}
