//! Local pre-flight checks run before a file is sent anywhere

use crate::model::error::ValidationError;
use crate::model::file_handle::FileHandle;
use crate::settings::upload_config::AcceptedFormats;

/// Checks the declared media type against the allow-list, then the size against
/// `max_size_bytes`. The type check wins when both fail.
pub fn validate(
    file: &FileHandle,
    formats: &AcceptedFormats,
    max_size_bytes: u64,
) -> Result<(), ValidationError> {
    if !formats.allows(&file.media_type) {
        return Err(ValidationError::UnsupportedType(file.media_type.clone()));
    }
    if file.size > max_size_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size,
            max_size: max_size_bytes,
        });
    }
    Ok(())
}
