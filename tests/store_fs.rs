use drive_archiver::contract::LocalStore;
use drive_archiver::store::{verify_download, DiskStore};
use tempfile::tempdir;

#[test]
fn ensure_dir_creates_nested_directories() {
    let dir = tempdir().unwrap();
    let store = DiskStore::new();
    let nested = dir.path().join("Photos/2024/2024-01");

    store.ensure_dir(&nested).expect("should create");
    assert!(nested.is_dir());

    // Idempotent.
    store.ensure_dir(&nested).expect("should be a no-op");
}

#[test]
fn atomic_write_creates_file_with_content() {
    let dir = tempdir().unwrap();
    let store = DiskStore::new();
    let dest = dir.path().join("sub/config.json");

    store.atomic_write(&dest, b"{\"ok\":true}").expect("should write");
    assert_eq!(std::fs::read(&dest).unwrap(), b"{\"ok\":true}");
}

#[test]
fn atomic_write_leaves_no_temp_siblings() {
    let dir = tempdir().unwrap();
    let store = DiskStore::new();
    let dest = dir.path().join("data.bin");

    store.atomic_write(&dest, b"abc").unwrap();
    store.atomic_write(&dest, b"replacement").unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("data.bin")]);
    assert_eq!(std::fs::read(&dest).unwrap(), b"replacement");
}

#[test]
fn exists_reflects_filesystem() {
    let dir = tempdir().unwrap();
    let store = DiskStore::new();
    let path = dir.path().join("present.txt");

    assert!(!store.exists(&path));
    std::fs::write(&path, b"x").unwrap();
    assert!(store.exists(&path));
}

#[test]
fn free_space_probes_nearest_existing_ancestor() {
    let dir = tempdir().unwrap();
    let store = DiskStore::new();

    let existing = store.free_space(dir.path()).expect("existing path");
    assert!(existing > 0);

    // A not-yet-created subpath reports the same volume.
    let missing = dir.path().join("not/created/yet");
    let via_ancestor = store.free_space(&missing).expect("ancestor probe");
    assert!(via_ancestor > 0);
}

#[test]
fn verify_rejects_missing_file() {
    let dir = tempdir().unwrap();
    assert!(!verify_download(&dir.path().join("nope.bin"), None));
}

#[test]
fn verify_rejects_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, b"").unwrap();
    assert!(!verify_download(&path, None));
}

#[test]
fn verify_checks_exact_size_when_expected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payload.bin");
    std::fs::write(&path, b"12345").unwrap();

    assert!(verify_download(&path, Some(5)));
    assert!(!verify_download(&path, Some(4)));
    assert!(!verify_download(&path, Some(6)));
}

#[test]
fn verify_accepts_any_nonzero_size_without_expectation() {
    // Google-doc exports: remote metadata says size 0, the exported bytes do
    // not match it, and that is fine.
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.docx");
    std::fs::write(&path, b"exported contents").unwrap();

    assert!(verify_download(&path, None));
}
