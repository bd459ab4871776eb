//! Trait contracts for the two external collaborators: the remote file store
//! and the local filesystem.
//!
//! The tasks in [`scan`](crate::scan) and [`archive`](crate::archive) only
//! ever talk to these traits, so the whole pipeline can run against the real
//! Drive API and disk ([`DriveClient`](crate::drive::DriveClient),
//! [`DiskStore`](crate::store::DiskStore)) or against deterministic `mockall`
//! mocks in tests.
//!
//! Both traits are annotated for `mockall`; enable the `test-export-mocks`
//! feature (on by default) to use `MockRemoteSource` / `MockLocalStore` from
//! dependent test suites.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::store::FsError;

/// Boxed error for remote source operations. Implementors convert all
/// meaningful upstream errors (HTTP, auth, decode) into this.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Byte-progress callback for a single transfer: `(bytes_so_far, total_bytes)`.
/// `total_bytes` is 0 when the remote does not report a length up front
/// (Google-doc exports).
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Authentication/transport failure reaching the remote store.
///
/// Unlike ordinary per-file transfer errors, this aborts a whole run: the
/// tasks downcast [`SourceError`] to this type to tell the two apart.
#[derive(Debug)]
pub struct AuthError(pub String);

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote authentication failed: {}", self.0)
    }
}

impl std::error::Error for AuthError {}

/// Returns `true` when a [`SourceError`] is an [`AuthError`] and the run
/// should be aborted rather than the current file skipped.
pub fn is_auth_error(err: &SourceError) -> bool {
    err.downcast_ref::<AuthError>().is_some()
}

/// Fixed-shape snapshot of one remote file, populated and defaulted at the
/// remote boundary so the core never handles missing-field ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRecord {
    /// Opaque, stable identity in the remote store.
    pub id: String,
    pub name: String,
    /// Size in bytes; the remote reports 0 for Google-native documents.
    pub size: u64,
    pub mime_type: String,
    /// RFC 3339 modification timestamp, when the remote supplied one.
    pub modified_time: Option<String>,
    /// Parent folder ids.
    pub parents: Vec<String>,
}

impl RemoteFileRecord {
    /// Size in megabytes.
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// One page of a remote listing.
#[derive(Debug, Clone)]
pub struct FilePage {
    pub files: Vec<RemoteFileRecord>,
    /// Token for the next page; `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Remote file store: paginated listing, content transfer and soft delete.
///
/// Implementations must exclude trashed items and items not owned by the
/// caller from listings, ordered most-recently-modified first. Size filtering
/// is not supported server-side; callers filter client-side.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch one page of file records. Pass the token from the previous
    /// page's [`FilePage::next_page_token`], or `None` for the first page.
    async fn list_page(
        &self,
        page_token: Option<String>,
        page_size: usize,
    ) -> Result<FilePage, SourceError>;

    /// Transfer one file's content to `dest`, reporting byte progress.
    ///
    /// For Google-native MIME types this is a format export rather than a raw
    /// byte transfer, and the returned path carries the export format's
    /// extension instead of `dest`'s. Implementations write atomically: no
    /// partially-written file is ever left at the returned path.
    async fn download(
        &self,
        file_id: &str,
        mime_type: &str,
        dest: &Path,
        progress: ProgressFn,
    ) -> Result<PathBuf, SourceError>;

    /// Move the remote file to the trash (reversible soft delete). Idempotent.
    async fn trash(&self, file_id: &str) -> Result<(), SourceError>;
}

/// Inert [`RemoteSource`] for runs that must never touch the network (dry
/// runs). Every operation fails, so an accidental remote call surfaces as a
/// per-file error instead of a silent transfer.
pub struct OfflineSource;

#[async_trait]
impl RemoteSource for OfflineSource {
    async fn list_page(
        &self,
        _page_token: Option<String>,
        _page_size: usize,
    ) -> Result<FilePage, SourceError> {
        Err("offline source: remote access is disabled".into())
    }

    async fn download(
        &self,
        _file_id: &str,
        _mime_type: &str,
        _dest: &Path,
        _progress: ProgressFn,
    ) -> Result<PathBuf, SourceError> {
        Err("offline source: remote access is disabled".into())
    }

    async fn trash(&self, _file_id: &str) -> Result<(), SourceError> {
        Err("offline source: remote access is disabled".into())
    }
}

/// Local filesystem operations needed by the archive pipeline.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait LocalStore: Send + Sync {
    /// Create `path` and any missing parents.
    fn ensure_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Write `data` to `path` via a temporary sibling plus rename, so the
    /// final path never holds a partially-written file.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    fn exists(&self, path: &Path) -> bool;

    /// Free space, in bytes, on the volume containing `path`.
    fn free_space(&self, path: &Path) -> Result<u64, FsError>;
}
