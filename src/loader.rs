//! Reading a selected file into memory.
//!
//! [`load_file`] is the equivalent of a file picker: it reads the raw bytes and
//! declares a media type from the file extension. The result is an unvalidated
//! [`SelectedFile`]; it becomes a [`SourceAsset`] only once the session admits
//! it through the [`FormatValidator`](crate::validation::FormatValidator).

use crate::formats::{SourceKind, UNKNOWN_MEDIA_TYPE, media_type_for_extension};
use crate::imaging::{BackendError, Dimensions, RasterBackend};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file as the user picked it: name, declared type, bytes. Not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Size of the file at `path` from its metadata, without reading it.
pub fn file_len(path: &Path) -> Result<u64, LoadError> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| LoadError::FileReadFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a file from disk, declaring its media type from the extension.
pub fn load_file(path: &Path) -> Result<SelectedFile, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::FileReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let media_type = path
        .extension()
        .and_then(|e| e.to_str())
        .map(media_type_for_extension)
        .unwrap_or(UNKNOWN_MEDIA_TYPE);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(path = %path.display(), media_type, bytes = bytes.len(), "file loaded");
    Ok(SelectedFile::new(name, media_type, bytes))
}

/// An admitted source file. Immutable for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    name: String,
    media_type: String,
    kind: SourceKind,
    bytes: Vec<u8>,
}

impl SourceAsset {
    /// Wrap a file that has already passed validation as `kind`.
    pub fn new(file: SelectedFile, kind: SourceKind) -> Self {
        Self {
            name: file.name,
            media_type: file.media_type,
            kind,
            bytes: file.bytes,
        }
    }

    /// Display name (file name as selected).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What a UI would show before converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    pub kind: SourceKind,
    pub dimensions: Dimensions,
    pub byte_len: u64,
}

/// Identify the asset's natural dimensions without encoding anything.
pub fn preview(
    backend: &impl RasterBackend,
    asset: &SourceAsset,
) -> Result<Preview, BackendError> {
    let dimensions = backend.identify(asset)?;
    Ok(Preview {
        kind: asset.kind(),
        dimensions,
        byte_len: asset.byte_len(),
    })
}
