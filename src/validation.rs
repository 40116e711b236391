//! Admission checks for a selected file.
//!
//! A file is admitted when its size is within the configured ceiling and its
//! declared media type is on the [`SUPPORTED_MEDIA_TYPES`] allowlist. The size
//! check runs first, so an oversized file is always reported as too large
//! whatever its type.

use crate::formats::{SUPPORTED_MEDIA_TYPES, SourceKind};
use crate::outcome::format_bytes;
use thiserror::Error;

/// Default upload ceiling: 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file format: {0}. Please select a valid image file.")]
    UnsupportedFormat(String),
    #[error("File size exceeds {} limit", limit_label(.limit))]
    FileTooLarge { size: u64, limit: u64 },
}

fn limit_label(limit: &u64) -> String {
    format_bytes(*limit)
}

/// Checks declared media type and byte length against the allowlist and ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatValidator {
    max_file_size: u64,
}

impl FormatValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// The size half of [`validate`](Self::validate), usable before any bytes
    /// are read.
    pub fn check_size(&self, byte_len: u64) -> Result<(), ValidationError> {
        if byte_len > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: byte_len,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Admit or reject a file. On success returns the parsed [`SourceKind`].
    pub fn validate(&self, media_type: &str, byte_len: u64) -> Result<SourceKind, ValidationError> {
        self.check_size(byte_len)?;
        SourceKind::from_media_type(media_type)
            .ok_or_else(|| ValidationError::UnsupportedFormat(media_type.to_string()))
    }

    /// The allowlist this validator enforces.
    pub fn supported_media_types(&self) -> &'static [&'static str] {
        SUPPORTED_MEDIA_TYPES
    }
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}
