use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{AppConfig, FilterMode, RuleSet};

/// Environment variable carrying the Drive OAuth bearer token. The consent
/// flow that produces it lives outside this crate.
pub const ACCESS_TOKEN_VAR: &str = "DRIVE_ACCESS_TOKEN";

/// On-disk settings shape. Every field is optional; missing keys fall back
/// to defaults so older settings files keep loading.
#[derive(Debug, Default, Deserialize)]
struct StaticConfig {
    #[serde(default)]
    archive: ArchiveSection,
    #[serde(default)]
    rules: RulesSection,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Default, Deserialize)]
struct RulesSection {
    #[serde(default)]
    filter_mode: Option<FilterMode>,
    #[serde(default)]
    min_size_mb: Option<u64>,
    #[serde(default)]
    before_date: Option<String>,
    #[serde(default)]
    include_google_docs: Option<bool>,
    #[serde(default)]
    dry_run: Option<bool>,
    #[serde(default)]
    trash_after: Option<bool>,
}

/// Load the JSON settings file into an [`AppConfig`], merging defaults for
/// any missing keys.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let static_conf: StaticConfig = serde_json::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config JSON");
        anyhow::anyhow!("Failed to parse config JSON: {e}")
    })?;

    let defaults = RuleSet::default();
    let rules = RuleSet {
        filter_mode: static_conf.rules.filter_mode.unwrap_or(defaults.filter_mode),
        min_size_mb: static_conf.rules.min_size_mb.unwrap_or(defaults.min_size_mb),
        // An empty string disables the cutoff, same as an absent key.
        before_date: static_conf
            .rules
            .before_date
            .filter(|date| !date.is_empty()),
        include_google_docs: static_conf
            .rules
            .include_google_docs
            .unwrap_or(defaults.include_google_docs),
    };

    if static_conf.archive.path.is_empty() {
        anyhow::bail!("Config is missing archive.path (the local archive root)");
    }

    let config = AppConfig {
        archive_root: static_conf.archive.path.into(),
        rules,
        dry_run: static_conf.rules.dry_run.unwrap_or(true),
        trash_after: static_conf.rules.trash_after.unwrap_or(true),
    };
    config.trace_loaded();
    Ok(config)
}

/// Fetch the Drive bearer token from the environment.
pub fn load_access_token() -> Result<String> {
    std::env::var(ACCESS_TOKEN_VAR).map_err(|e| {
        error!(error = ?e, "{} environment variable not set", ACCESS_TOKEN_VAR);
        anyhow::anyhow!("{ACCESS_TOKEN_VAR} environment variable not set: {e}")
    })
}
