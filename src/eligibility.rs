//! Eligibility rules deciding which remote files qualify for archiving.
//!
//! The predicate is pure and total: it never fails, it only accepts or
//! rejects. Policy order matters — non-content types are rejected outright,
//! then the date cutoff applies, then Google-native documents bypass the size
//! threshold (the remote reports them as size 0 even though their exported
//! content is not).

use crate::config::RuleSet;
use crate::contract::RemoteFileRecord;

/// Google-native document types: size is reported as 0 by the remote, real
/// content only exists once exported to a conventional format.
pub const GOOGLE_DOC_TYPES: &[&str] = &[
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.spreadsheet",
    "application/vnd.google-apps.presentation",
    "application/vnd.google-apps.drawing",
];

/// Non-archivable content: folders, shortcuts, forms, maps, sites.
pub const SKIP_MIME_TYPES: &[&str] = &[
    "application/vnd.google-apps.shortcut",
    "application/vnd.google-apps.form",
    "application/vnd.google-apps.map",
    "application/vnd.google-apps.site",
    "application/vnd.google-apps.folder",
];

/// Whether `mime_type` is a Google-native document type that requires export.
pub fn is_google_doc(mime_type: &str) -> bool {
    GOOGLE_DOC_TYPES.contains(&mime_type)
}

/// Whether `record` qualifies for archiving under `rules`.
///
/// In order:
/// 1. Skip types are never eligible.
/// 2. With a `before_date` cutoff, a file modified on or after that date is
///    rejected ("before" is strict). The comparison is lexicographic on the
///    `YYYY-MM-DD` prefix of the modification timestamp.
/// 3. Google-native documents are eligible iff `include_google_docs`; the
///    size threshold does not apply to them.
/// 4. Everything else is eligible iff its size meets the threshold (a size
///    exactly equal to the threshold qualifies).
pub fn is_eligible(record: &RemoteFileRecord, rules: &RuleSet) -> bool {
    if SKIP_MIME_TYPES.contains(&record.mime_type.as_str()) {
        return false;
    }

    if let (Some(before), Some(modified)) = (&rules.before_date, &record.modified_time) {
        // Wire timestamps arrive unvalidated; fall back to the whole string
        // when byte 10 is not a char boundary.
        let day = modified.get(..10).unwrap_or(modified);
        if day >= before.as_str() {
            return false;
        }
    }

    if is_google_doc(&record.mime_type) {
        return rules.include_google_docs;
    }

    record.size >= rules.min_size_bytes()
}

/// Apply [`is_eligible`] over `records`, preserving input order.
pub fn filter_eligible(records: &[RemoteFileRecord], rules: &RuleSet) -> Vec<RemoteFileRecord> {
    records
        .iter()
        .filter(|record| is_eligible(record, rules))
        .cloned()
        .collect()
}

/// Total size in bytes of a set of records.
pub fn total_size(records: &[RemoteFileRecord]) -> u64 {
    records.iter().map(|record| record.size).sum()
}
