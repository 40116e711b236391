//! Where a converted file goes when the user downloads it.

use std::io;
use std::path::{Path, PathBuf};

/// File-save collaborator. Receives the suggested name and the encoded bytes.
pub trait SaveTarget {
    /// Persist `bytes` under `file_name`, returning where they ended up.
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Saves into a directory, creating it if needed. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "converted file saved");
        Ok(path)
    }
}
