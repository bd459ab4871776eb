//! Task lifecycle, cooperative cancellation and the runner that owns the
//! worker-context contract.
//!
//! Both pipeline stages ([`ScanTask`](crate::scan::ScanTask) and
//! [`ArchiveTask`](crate::archive::ArchiveTask)) implement [`Task`]: a
//! `run()` that drives the state machine to one of three terminal states, and
//! a shared cancellation flag. There is no other shared base state — each
//! task owns its own config snapshot, result accumulation and event channel.
//!
//! Cancellation is cooperative, never preemptive: the flag is set once from
//! the caller's context and read by the worker only at well-defined
//! boundaries (between listing pages, between files). In-flight I/O for the
//! current item always runs to completion or failure first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle of a task run. A task instance is never reused: once terminal
/// (`Completed`, `Cancelled` or `Failed`) it stays terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Cancelled | TaskState::Failed
        )
    }
}

/// Set-once cancellation flag, shared between the caller and the worker.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any context, any number of
    /// times; the flag only ever transitions unset -> set.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A cancellable unit of work with three terminal states.
#[async_trait]
pub trait Task: Send {
    /// Drive the task from `Idle` to a terminal state, emitting events on the
    /// channel supplied at construction.
    async fn run(&mut self) -> TaskState;

    /// The task's cancellation flag, for handing to the caller's context.
    fn cancel_flag(&self) -> CancellationFlag;
}

/// Handle to a spawned task: cancellation from the caller's context plus the
/// join point for its terminal state.
pub struct TaskHandle {
    cancel: CancellationFlag,
    join: JoinHandle<TaskState>,
}

impl TaskHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.request();
    }

    /// Wait for the worker to reach a terminal state.
    pub async fn wait(self) -> TaskState {
        // A panicked worker never reported a terminal state; treat as failed.
        self.join.await.unwrap_or(TaskState::Failed)
    }
}

/// Spawns tasks onto dedicated worker contexts and owns the shutdown
/// contract.
///
/// The runner does not serialize concurrent runs of the same kind; the caller
/// layer enforces single-flight per task kind.
pub struct TaskRunner {
    shutdown_timeout: Duration,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        Self {
            shutdown_timeout: Self::DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_shutdown_timeout(timeout: Duration) -> Self {
        Self {
            shutdown_timeout: timeout,
        }
    }

    /// Spawn `task` on a dedicated worker context. The caller never blocks on
    /// task internals; all updates arrive through the task's event channel.
    pub fn spawn<T>(&self, mut task: T) -> TaskHandle
    where
        T: Task + 'static,
    {
        let cancel = task.cancel_flag();
        let join = tokio::spawn(async move { task.run().await });
        TaskHandle { cancel, join }
    }

    /// Request cancellation and wait, bounded by the shutdown timeout, for
    /// the worker to reach a terminal state. On timeout the worker is
    /// abandoned — detached, not aborted — and `None` is returned.
    pub async fn shutdown(&self, handle: TaskHandle) -> Option<TaskState> {
        let TaskHandle { cancel, join } = handle;
        cancel.request();
        match tokio::time::timeout(self.shutdown_timeout, join).await {
            Ok(joined) => {
                let state = joined.unwrap_or(TaskState::Failed);
                info!(?state, "Worker reached terminal state during shutdown");
                Some(state)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Worker did not finish before shutdown timeout; abandoning"
                );
                None
            }
        }
    }
}
