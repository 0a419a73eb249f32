//! File picker for the drop zone
//!
//! Dragging files onto a terminal pastes their paths. This module turns such a
//! payload (or a typed line) into paths, and the paths into accepted and
//! rejected candidates, before the uploader's own validation runs.

use crate::model::error::RejectionReason;
use crate::model::file_handle::FileHandle;
use crate::settings::upload_config::AcceptedFormats;
use percent_encoding::percent_decode;
use std::path::PathBuf;

/// A candidate the picker turned away
#[derive(Debug, Clone, PartialEq)]
pub struct FileRejection {
    pub file: FileHandle,
    pub reason: RejectionReason,
}

/// Outcome of one drop or selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub accepted: Vec<FileHandle>,
    pub rejected: Vec<FileRejection>,
}

#[derive(Debug, Clone)]
pub struct FilePicker {
    formats: AcceptedFormats,
    max_size_bytes: u64,
    multiple: bool,
}

impl FilePicker {
    pub fn new(formats: AcceptedFormats, max_size_bytes: u64, multiple: bool) -> Self {
        FilePicker {
            formats,
            max_size_bytes,
            multiple,
        }
    }

    /// Resolve dropped paths into candidates. With `multiple` off, a drop of more
    /// than one file of an accepted type rejects every such candidate.
    ///
    /// Candidates of a type outside the allow-list are never rejected here: they
    /// are passed on as accepted so validation drops them without a record.
    pub async fn pick(&self, paths: Vec<PathBuf>) -> Selection {
        let (screened, passed_on): (Vec<_>, Vec<_>) = paths
            .into_iter()
            .map(|path| FileHandle::new(path, 0))
            .partition(|candidate| self.formats.allows(&candidate.media_type));
        let too_many = !self.multiple && screened.len() > 1;
        let mut selection = Selection::default();

        for candidate in passed_on {
            let size = match tokio::fs::metadata(&candidate.path).await {
                Ok(meta) => meta.len(),
                Err(_) => 0,
            };
            selection.accepted.push(FileHandle { size, ..candidate });
        }

        for candidate in screened {
            let (file, reason) = match tokio::fs::metadata(&candidate.path).await {
                Ok(meta) if meta.is_file() => {
                    let file = FileHandle {
                        size: meta.len(),
                        ..candidate
                    };
                    let reason = if too_many {
                        Some(RejectionReason::TooManyFiles)
                    } else if file.size > self.max_size_bytes {
                        Some(RejectionReason::FileTooLarge)
                    } else {
                        None
                    };
                    (file, reason)
                }
                Ok(_) | Err(_) => {
                    let reason = if too_many {
                        RejectionReason::TooManyFiles
                    } else {
                        RejectionReason::FileNotFound
                    };
                    (candidate, Some(reason))
                }
            };

            match reason {
                Some(reason) => {
                    tracing::debug!("Picker rejected {}: {}", file.name, reason);
                    selection.rejected.push(FileRejection { file, reason });
                }
                None => selection.accepted.push(file),
            }
        }
        selection
    }
}

/// Split a pasted or typed string into paths.
///
/// Understands whitespace and newline separated lists, single and double
/// quotes, backslash escaped characters and `file://` URIs.
pub fn parse_paths(input: &str) -> Vec<PathBuf> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    in_token = true;
                }
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| PathBuf::from(decode_file_uri(&t)))
        .collect()
}

fn decode_file_uri(token: &str) -> String {
    match token.strip_prefix("file://") {
        Some(rest) => {
            // file://localhost/path and file:///path both address /path
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            percent_decode(rest.as_bytes())
                .decode_utf8()
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| {
                    tracing::warn!("Failed to decode file uri: {}", token);
                    rest.to_string()
                })
        }
        None => token.to_string(),
    }
}
