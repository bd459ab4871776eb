//! Local filesystem backend for the archive.
//!
//! [`DiskStore`] is the production [`LocalStore`] implementation. Writes go
//! through a uniquely-named temporary sibling followed by a rename, so a
//! crash mid-write never leaves a partial file at the final path.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::contract::LocalStore;

/// Filesystem operation error.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    General(String),
}

/// [`LocalStore`] backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl DiskStore {
    pub fn new() -> Self {
        Self
    }
}

impl LocalStore for DiskStore {
    fn ensure_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| FsError::General(format!("not a file path: {}", path.display())))?
            .to_string_lossy()
            .into_owned();
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, data).and_then(|()| fs::rename(&temp_path, path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = data.len(), "Atomic write complete");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn free_space(&self, path: &Path) -> Result<u64, FsError> {
        // The path itself may not exist yet; probe the nearest existing
        // ancestor on the same volume.
        let mut target = path;
        while !target.exists() {
            target = target
                .parent()
                .ok_or_else(|| FsError::General(format!("no existing ancestor for {}", path.display())))?;
        }
        Ok(fs2::available_space(target)?)
    }
}

/// Verify a completed transfer at `path`.
///
/// The file must exist and be non-empty. When `expected_size` is known it
/// must match exactly; callers pass `None` for Google-doc exports, whose byte
/// size is not predictable from remote metadata.
pub fn verify_download(path: &Path, expected_size: Option<u64>) -> bool {
    let actual = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };

    if actual == 0 {
        return false;
    }

    match expected_size {
        Some(expected) => actual == expected,
        None => true,
    }
}
