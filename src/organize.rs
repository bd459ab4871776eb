//! Deterministic placement of archived files under the local archive root.
//!
//! Layout:
//!
//! ```text
//! <root>/Photos/YYYY/YYYY-MM/<name>
//! <root>/Videos/YYYY/YYYY-MM/<name>
//! <root>/Documents/YYYY/YYYY-MM/<name>
//! <root>/Audio/<name>
//! <root>/Archives/<name>
//! <root>/Installers/<name>
//! <root>/Other/<name>
//! ```
//!
//! Planning is pure: every input maps to a path, and collision resolution
//! against the [`LocalStore`] always terminates with an unused name.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};

use crate::classify::classify;
use crate::contract::LocalStore;

/// Placeholder when a cleaned file name ends up empty.
const FALLBACK_NAME: &str = "unnamed";

/// Characters not allowed in file names on at least one supported platform.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace filesystem-illegal characters with `_`, trim leading/trailing
/// spaces and dots, and substitute a placeholder when nothing is left.
pub fn clean_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Parse an RFC 3339 modification timestamp from the remote store
/// (`2024-01-15T10:30:00.000Z`, with or without fractional seconds).
/// `None` for anything unparseable.
pub fn parse_remote_date(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    // Offset-less timestamps still occur in older exports.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Plan the local destination for a file.
///
/// Date-bucketed categories nest under `YYYY/YYYY-MM` when a modification
/// date is available; everything else goes directly under the category
/// folder. The name is used as given — clean it first with
/// [`clean_filename`].
pub fn local_path(
    archive_root: &Path,
    name: &str,
    mime_type: Option<&str>,
    modified: Option<NaiveDateTime>,
) -> PathBuf {
    let category = classify(name, mime_type);

    match modified {
        Some(date) if category.is_date_bucketed() => {
            let year = date.year();
            let month = format!("{}-{:02}", year, date.month());
            archive_root
                .join(category.as_str())
                .join(year.to_string())
                .join(month)
                .join(name)
        }
        _ => archive_root.join(category.as_str()).join(name),
    }
}

/// Resolve `dest` to a path that does not yet exist in `store`.
///
/// An unoccupied `dest` is returned unchanged; otherwise ` (1)`, ` (2)`, …
/// are appended to the stem, in order, until an unused name is found.
pub fn unique_path(store: &dyn LocalStore, dest: &Path) -> PathBuf {
    if !store.exists(dest) {
        return dest.to_path_buf();
    }

    let parent = dest.parent().unwrap_or_else(|| Path::new(""));
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_NAME.to_string());
    let extension = dest.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1usize;
    loop {
        let candidate_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = parent.join(candidate_name);
        if !store.exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Format a byte count as a human-readable string.
pub fn format_size(size_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let bytes = size_bytes as f64;
    if bytes < KB {
        format!("{} B", size_bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes / KB)
    } else if bytes < GB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.2} GB", bytes / GB)
    }
}
