//! Discovery stage: paginated listing of the remote store filtered down to
//! the eligible file set.
//!
//! The task streams pages through a client-side pre-filter (the remote cannot
//! filter by size server-side), emits a running count per page, and checks
//! the cancellation flag between pages — never mid-page. The authoritative
//! [`filter_eligible`] pass runs once over the full accumulated set before
//! completion.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::config::RuleSet;
use crate::contract::{RemoteFileRecord, RemoteSource};
use crate::eligibility::{filter_eligible, is_google_doc};
use crate::task::{CancellationFlag, Task, TaskState};

/// Records fetched per listing call.
pub const SCAN_PAGE_SIZE: usize = 100;

/// Events emitted by a [`ScanTask`] over its run.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Human-readable status text.
    Status(String),
    /// Running count of pre-filtered files found so far, once per page.
    Progress { found: usize },
    /// Terminal: the eligible file set. Emitted exactly once on success.
    Completed { files: Vec<RemoteFileRecord> },
    /// Terminal: unrecoverable transport error. The run is not retried.
    Failed { message: String },
}

/// Scans the remote store for files matching a [`RuleSet`].
pub struct ScanTask {
    source: Arc<dyn RemoteSource>,
    rules: RuleSet,
    events: UnboundedSender<ScanEvent>,
    cancel: CancellationFlag,
    state: TaskState,
}

impl ScanTask {
    /// Build a scan over `source` with an immutable snapshot of `rules`.
    /// Events stream to `events` from the worker context.
    pub fn new(
        source: Arc<dyn RemoteSource>,
        rules: RuleSet,
        events: UnboundedSender<ScanEvent>,
    ) -> Self {
        Self {
            source,
            rules,
            events,
            cancel: CancellationFlag::new(),
            state: TaskState::Idle,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn emit(&self, event: ScanEvent) {
        // A disconnected receiver means the caller went away; keep running to
        // a terminal state regardless.
        let _ = self.events.send(event);
    }

    /// Page-time pre-filter: cheap size cut so the accumulated set stays
    /// small. Google-native documents always pass (their reported size is 0);
    /// the authoritative filter decides about them at the end.
    fn passes_prefilter(&self, record: &RemoteFileRecord) -> bool {
        record.size >= self.rules.min_size_bytes() || is_google_doc(&record.mime_type)
    }
}

#[async_trait]
impl Task for ScanTask {
    async fn run(&mut self) -> TaskState {
        self.state = TaskState::Running;
        self.emit(ScanEvent::Status("Scanning files...".to_string()));

        let mut found: Vec<RemoteFileRecord> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            if self.cancel.is_requested() {
                info!(found = found.len(), "Scan cancelled between pages");
                self.emit(ScanEvent::Status("Scan cancelled".to_string()));
                self.state = TaskState::Cancelled;
                return self.state;
            }

            let page = match self.source.list_page(page_token.take(), SCAN_PAGE_SIZE).await {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, "Listing page failed; aborting scan");
                    self.emit(ScanEvent::Failed {
                        message: format!("Failed to list files: {e}"),
                    });
                    self.state = TaskState::Failed;
                    return self.state;
                }
            };

            found.extend(
                page.files
                    .into_iter()
                    .filter(|record| self.passes_prefilter(record)),
            );
            self.emit(ScanEvent::Progress { found: found.len() });

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        self.emit(ScanEvent::Status("Filtering eligible files...".to_string()));
        let eligible = filter_eligible(&found, &self.rules);

        info!(
            fetched = found.len(),
            eligible = eligible.len(),
            "Scan complete"
        );
        self.emit(ScanEvent::Status(format!("Found {} files", eligible.len())));
        self.emit(ScanEvent::Completed { files: eligible });
        self.state = TaskState::Completed;
        self.state
    }

    fn cancel_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }
}
