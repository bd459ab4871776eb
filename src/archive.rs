//! Transfer stage: placement, download (or simulation), verification and
//! optional remote trash, one file at a time.
//!
//! Failure isolation is per file: a bad transfer records a failed
//! [`TransferOutcome`] and the run moves on. Only an authentication failure
//! reaching the remote store aborts the whole run. Every submitted file
//! yields exactly one outcome — there is no automatic re-attempt; a caller
//! that wants a retry re-submits the file in a new run.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::contract::{is_auth_error, LocalStore, RemoteFileRecord, RemoteSource};
use crate::drive::export_format;
use crate::eligibility::is_google_doc;
use crate::organize::{clean_filename, local_path, parse_remote_date, unique_path};
use crate::store::verify_download;
use crate::task::{CancellationFlag, Task, TaskState};

/// Per-file result of an archive run.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub name: String,
    pub success: bool,
    /// Human-readable detail: destination on success, reason on failure.
    pub detail: String,
    /// Final local path, when the transfer succeeded (or would have, in a
    /// dry run).
    pub local_path: Option<PathBuf>,
}

/// Aggregate counts for a finished (or cancelled) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Events emitted by an [`ArchiveTask`] over its run.
#[derive(Debug, Clone)]
pub enum ArchiveEvent {
    /// Human-readable status text.
    Status(String),
    /// Overall progress, emitted before each file: `current` is 1-based.
    Progress {
        current: usize,
        total: usize,
        name: String,
    },
    /// Byte progress for the file currently transferring.
    FileProgress { downloaded: u64, total: u64 },
    /// Per-file result, emitted after each file.
    FileResult {
        name: String,
        success: bool,
        detail: String,
    },
    /// Terminal counts. Also emitted on cancellation, with the partial counts
    /// accumulated up to that point.
    Completed { succeeded: usize, failed: usize },
    /// Terminal: whole-run failure (e.g. remote authentication).
    Failed { message: String },
}

/// Archives an ordered list of files into the local store.
pub struct ArchiveTask {
    source: Arc<dyn RemoteSource>,
    store: Arc<dyn LocalStore>,
    files: Vec<RemoteFileRecord>,
    archive_root: PathBuf,
    dry_run: bool,
    trash_after: bool,
    events: UnboundedSender<ArchiveEvent>,
    cancel: CancellationFlag,
    state: TaskState,
}

impl ArchiveTask {
    /// Build an archive run over `files` (processed in order). `archive_root`
    /// must be a valid destination root; validating it is the caller's job.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn RemoteSource>,
        store: Arc<dyn LocalStore>,
        files: Vec<RemoteFileRecord>,
        archive_root: PathBuf,
        dry_run: bool,
        trash_after: bool,
        events: UnboundedSender<ArchiveEvent>,
    ) -> Self {
        Self {
            source,
            store,
            files,
            archive_root,
            dry_run,
            trash_after,
            events,
            cancel: CancellationFlag::new(),
            state: TaskState::Idle,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn emit(&self, event: ArchiveEvent) {
        let _ = self.events.send(event);
    }

    /// Process one file to exactly one outcome. `Err` only for failures that
    /// abort the whole run.
    async fn process_file(
        &self,
        record: &RemoteFileRecord,
    ) -> Result<TransferOutcome, String> {
        let modified = record
            .modified_time
            .as_deref()
            .and_then(parse_remote_date);
        let clean_name = clean_filename(&record.name);
        let mut planned = local_path(
            &self.archive_root,
            &clean_name,
            Some(&record.mime_type),
            modified,
        );
        // Google-native documents land with their export format's extension;
        // collision resolution has to probe the name that will exist on disk.
        if let Some((_, extension)) = export_format(&record.mime_type) {
            planned = planned.with_extension(extension);
        }
        let dest = unique_path(self.store.as_ref(), &planned);

        if self.dry_run {
            let action = if self.trash_after {
                "Would download and trash"
            } else {
                "Would download"
            };
            return Ok(TransferOutcome {
                name: record.name.clone(),
                success: true,
                detail: format!("{} to {}", action, dest.display()),
                local_path: Some(dest),
            });
        }

        self.emit(ArchiveEvent::Status(format!("Downloading: {}", record.name)));

        if let Some(parent) = dest.parent() {
            if let Err(e) = self.store.ensure_dir(parent) {
                return Ok(TransferOutcome {
                    name: record.name.clone(),
                    success: false,
                    detail: format!("Could not create destination folder: {e}"),
                    local_path: None,
                });
            }
        }

        let progress_events = self.events.clone();
        let on_progress: crate::contract::ProgressFn = Box::new(move |downloaded, total| {
            let _ = progress_events.send(ArchiveEvent::FileProgress { downloaded, total });
        });

        let actual_path = match self
            .source
            .download(&record.id, &record.mime_type, &dest, on_progress)
            .await
        {
            Ok(path) => path,
            Err(e) if is_auth_error(&e) => return Err(e.to_string()),
            Err(e) => {
                warn!(file = %record.name, error = %e, "Download failed");
                return Ok(TransferOutcome {
                    name: record.name.clone(),
                    success: false,
                    detail: e.to_string(),
                    local_path: None,
                });
            }
        };

        // Exports are rewritten to a conventional format, so their byte size
        // is not comparable to remote metadata.
        let expected_size = if is_google_doc(&record.mime_type) {
            None
        } else {
            Some(record.size)
        };
        if !verify_download(&actual_path, expected_size) {
            warn!(file = %record.name, path = %actual_path.display(), "Verification failed");
            return Ok(TransferOutcome {
                name: record.name.clone(),
                success: false,
                detail: "Download verification failed".to_string(),
                local_path: None,
            });
        }

        if self.trash_after {
            self.emit(ArchiveEvent::Status(format!(
                "Moving to trash: {}",
                record.name
            )));
            match self.source.trash(&record.id).await {
                Ok(()) => {}
                Err(e) if is_auth_error(&e) => return Err(e.to_string()),
                Err(e) => {
                    // The verified local copy is retained; only the remote
                    // cleanup failed.
                    warn!(file = %record.name, error = %e, "Trash failed after verified download");
                    return Ok(TransferOutcome {
                        name: record.name.clone(),
                        success: false,
                        detail: format!("trash failed: {e}"),
                        local_path: Some(actual_path),
                    });
                }
            }
        }

        let action = if self.trash_after {
            "Downloaded and trashed"
        } else {
            "Downloaded"
        };
        Ok(TransferOutcome {
            name: record.name.clone(),
            success: true,
            detail: format!("{} to {}", action, actual_path.display()),
            local_path: Some(actual_path),
        })
    }
}

#[async_trait]
impl Task for ArchiveTask {
    async fn run(&mut self) -> TaskState {
        self.state = TaskState::Running;

        let total = self.files.len();
        let mut summary = ArchiveSummary::default();

        self.emit(ArchiveEvent::Status(if self.dry_run {
            "Dry run - simulating archive...".to_string()
        } else {
            "Archiving files...".to_string()
        }));

        let files = std::mem::take(&mut self.files);
        for (index, record) in files.iter().enumerate() {
            if self.cancel.is_requested() {
                info!(
                    processed = index,
                    total,
                    "Archive cancelled between files"
                );
                self.emit(ArchiveEvent::Status("Archive cancelled".to_string()));
                self.emit(ArchiveEvent::Completed {
                    succeeded: summary.succeeded,
                    failed: summary.failed,
                });
                self.state = TaskState::Cancelled;
                return self.state;
            }

            self.emit(ArchiveEvent::Progress {
                current: index + 1,
                total,
                name: record.name.clone(),
            });

            match self.process_file(record).await {
                Ok(outcome) => {
                    if outcome.success {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                    self.emit(ArchiveEvent::FileResult {
                        name: outcome.name,
                        success: outcome.success,
                        detail: outcome.detail,
                    });
                }
                Err(message) => {
                    error!(error = %message, "Archive run aborted");
                    self.emit(ArchiveEvent::Failed { message });
                    self.state = TaskState::Failed;
                    return self.state;
                }
            }
        }

        let mode = if self.dry_run { "Dry run" } else { "Archive" };
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "{} complete",
            mode
        );
        self.emit(ArchiveEvent::Status(format!(
            "{} complete: {} succeeded, {} failed",
            mode, summary.succeeded, summary.failed
        )));
        self.emit(ArchiveEvent::Completed {
            succeeded: summary.succeeded,
            failed: summary.failed,
        });
        self.state = TaskState::Completed;
        self.state
    }

    fn cancel_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }
}
