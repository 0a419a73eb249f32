//! Structured error types for validation, picking and transfer operations

use std::fmt;

/// Local pre-flight check failures, never sent over the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared media type is not on the allow-list
    UnsupportedType(String),
    /// File is larger than the configured ceiling
    TooLarge { size: u64, max_size: u64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsupportedType(media_type) if media_type.is_empty() => {
                write!(f, "Unsupported media type: unknown")
            }
            ValidationError::UnsupportedType(media_type) => {
                write!(f, "Unsupported media type: {}", media_type)
            }
            ValidationError::TooLarge { size, max_size } => {
                write!(f, "File too large: {} bytes (max {} bytes)", size, max_size)
            }
        }
    }
}

/// Reasons the file picker turns a candidate away before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    FileTooLarge,
    TooManyFiles,
    FileNotFound,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::FileTooLarge => write!(f, "File is larger than the allowed size"),
            RejectionReason::TooManyFiles => write!(f, "Too many files"),
            RejectionReason::FileNotFound => write!(f, "File not found or not a regular file"),
        }
    }
}

/// Errors that can occur while talking to the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Network or connectivity error
    Network(String),
    /// Server answered with an error status
    Status(u16),
    /// Reading the local file failed
    Io(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Network(msg) => write!(f, "Network error: {}", msg),
            TransferError::Status(code) => write!(f, "Server responded with status {}", code),
            TransferError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<reqwest::Error> for TransferError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => TransferError::Status(status.as_u16()),
            None => TransferError::Network(e.to_string()),
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        TransferError::Io(e.to_string())
    }
}

/// Result type for transfer operations
pub type TransferResult<T = ()> = Result<T, TransferError>;
