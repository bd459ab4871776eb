use drive_archiver::classify::{classify, Category};
use drive_archiver::config::{FilterMode, RuleSet};
use drive_archiver::contract::RemoteFileRecord;
use drive_archiver::eligibility::{
    filter_eligible, is_eligible, is_google_doc, total_size, GOOGLE_DOC_TYPES, SKIP_MIME_TYPES,
};

fn record(name: &str, size: u64, mime_type: &str) -> RemoteFileRecord {
    RemoteFileRecord {
        id: format!("id-{name}"),
        name: name.to_string(),
        size,
        mime_type: mime_type.to_string(),
        modified_time: Some("2019-06-15T10:30:00.000Z".to_string()),
        parents: vec![],
    }
}

fn size_rules(min_size_mb: u64) -> RuleSet {
    RuleSet {
        filter_mode: FilterMode::Size,
        min_size_mb,
        before_date: None,
        include_google_docs: true,
    }
}

#[test]
fn classify_known_extensions() {
    assert_eq!(classify("holiday.jpg", None), Category::Photos);
    assert_eq!(classify("clip.MKV", None), Category::Videos);
    assert_eq!(classify("song.flac", None), Category::Audio);
    assert_eq!(classify("report.pdf", None), Category::Documents);
    assert_eq!(classify("backup.tar", None), Category::Archives);
    assert_eq!(classify("setup.exe", None), Category::Installers);
}

#[test]
fn classify_unknown_maps_to_other() {
    assert_eq!(classify("data.xyz", None), Category::Other);
    assert_eq!(classify("no_extension", None), Category::Other);
    assert_eq!(classify("", None), Category::Other);
    assert_eq!(classify(".bashrc", None), Category::Other);
}

#[test]
fn classify_mime_takes_precedence_over_extension() {
    // The extension says document, the MIME hint says photo.
    assert_eq!(
        classify("scan.pdf", Some("image/jpeg")),
        Category::Photos
    );
    // Unknown MIME falls back to the extension.
    assert_eq!(
        classify("scan.pdf", Some("application/x-unknown")),
        Category::Documents
    );
}

#[test]
fn classify_google_doc_types_are_documents() {
    assert_eq!(
        classify("Quarterly plan", Some("application/vnd.google-apps.document")),
        Category::Documents
    );
    assert_eq!(
        classify("Budget", Some("application/vnd.google-apps.spreadsheet")),
        Category::Documents
    );
}

#[test]
fn classify_is_deterministic() {
    for _ in 0..3 {
        assert_eq!(classify("a.jpg", Some("video/mp4")), Category::Videos);
    }
}

#[test]
fn size_threshold_boundary_is_inclusive() {
    let rules = size_rules(200);
    let exactly = record("big.bin", 200 * 1024 * 1024, "application/octet-stream");
    let one_under = record("small.bin", 200 * 1024 * 1024 - 1, "application/octet-stream");

    assert!(is_eligible(&exactly, &rules));
    assert!(!is_eligible(&one_under, &rules));
}

#[test]
fn skip_mime_types_are_never_eligible() {
    let rules = size_rules(0);
    for mime in SKIP_MIME_TYPES {
        let huge = record("thing", 10 * 1024 * 1024 * 1024, mime);
        assert!(!is_eligible(&huge, &rules), "{mime} should be skipped");
    }
}

#[test]
fn before_date_cutoff_is_strict() {
    let mut rules = size_rules(0);
    rules.before_date = Some("2020-01-01".to_string());

    let mut on_cutoff = record("on.bin", 1024, "application/octet-stream");
    on_cutoff.modified_time = Some("2020-01-01T00:00:00.000Z".to_string());
    assert!(!is_eligible(&on_cutoff, &rules), "on the cutoff date is excluded");

    let mut after = record("after.bin", 1024, "application/octet-stream");
    after.modified_time = Some("2021-07-04T12:00:00.000Z".to_string());
    assert!(!is_eligible(&after, &rules));

    let mut before = record("before.bin", 1024, "application/octet-stream");
    before.modified_time = Some("2019-12-31T23:59:59.000Z".to_string());
    assert!(is_eligible(&before, &rules));
}

#[test]
fn before_date_tolerates_malformed_timestamps() {
    let mut rules = size_rules(0);
    rules.before_date = Some("2021-01-01".to_string());

    // Multi-byte character straddling the YYYY-MM-DD prefix boundary.
    let mut non_ascii = record("odd.bin", 1024, "application/octet-stream");
    non_ascii.modified_time = Some("2020-01-0éx".to_string());
    assert!(is_eligible(&non_ascii, &rules));

    let mut short = record("short.bin", 1024, "application/octet-stream");
    short.modified_time = Some("2020".to_string());
    assert!(is_eligible(&short, &rules));
}

#[test]
fn google_docs_bypass_size_threshold() {
    let mut rules = size_rules(200);
    let doc = record("Notes", 0, "application/vnd.google-apps.spreadsheet");

    rules.include_google_docs = true;
    assert!(is_eligible(&doc, &rules), "included regardless of size 0");

    rules.include_google_docs = false;
    assert!(!is_eligible(&doc, &rules));
}

#[test]
fn filter_preserves_input_order() {
    let rules = size_rules(1);
    let mb = 1024 * 1024;
    let records = vec![
        record("c.bin", 3 * mb, "application/octet-stream"),
        record("tiny.bin", 1, "application/octet-stream"),
        record("a.bin", 2 * mb, "application/octet-stream"),
        record("b.bin", 5 * mb, "application/octet-stream"),
    ];

    let eligible = filter_eligible(&records, &rules);
    let names: Vec<&str> = eligible.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["c.bin", "a.bin", "b.bin"]);
}

#[test]
fn total_size_sums_bytes() {
    let records = vec![
        record("a", 100, "application/octet-stream"),
        record("b", 250, "application/octet-stream"),
    ];
    assert_eq!(total_size(&records), 350);
}

#[test]
fn google_doc_type_detection() {
    for mime in GOOGLE_DOC_TYPES {
        assert!(is_google_doc(mime));
    }
    assert!(!is_google_doc("application/pdf"));
    assert!(!is_google_doc("application/vnd.google-apps.folder"));
}
