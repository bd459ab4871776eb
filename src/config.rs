use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which rule dimension the caller is editing. The core applies whatever
/// fields are present in the [`RuleSet`] snapshot regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Size,
    Date,
}

/// Eligibility rules for one scan/archive run. Immutable once a task has
/// taken its snapshot; a new run takes a new snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub filter_mode: FilterMode,
    /// Minimum file size in MB for regular files.
    pub min_size_mb: u64,
    /// Only include files strictly modified before this `YYYY-MM-DD` date.
    /// `None` disables the date cutoff.
    pub before_date: Option<String>,
    /// Whether Google-native documents (reported as size 0) are included.
    pub include_google_docs: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Size,
            min_size_mb: 200,
            before_date: None,
            include_google_docs: true,
        }
    }
}

impl RuleSet {
    /// Minimum size threshold in bytes.
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_mb * 1024 * 1024
    }
}

/// Application configuration for a run, read once at task construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of the local archive.
    pub archive_root: PathBuf,
    pub rules: RuleSet,
    /// Simulate only: no network transfers, no filesystem writes.
    pub dry_run: bool,
    /// Move remote originals to the trash after a verified download.
    pub trash_after: bool,
}

impl AppConfig {
    pub fn trace_loaded(&self) {
        info!(
            archive_root = %self.archive_root.display(),
            min_size_mb = self.rules.min_size_mb,
            before_date = self.rules.before_date.as_deref().unwrap_or(""),
            dry_run = self.dry_run,
            trash_after = self.trash_after,
            "Loaded AppConfig"
        );
        debug!(config = ?self, "AppConfig loaded (full debug)");
    }
}
