use std::sync::{Arc, OnceLock};

use drive_archiver::config::{FilterMode, RuleSet};
use drive_archiver::contract::{FilePage, MockRemoteSource, RemoteFileRecord};
use drive_archiver::scan::{ScanEvent, ScanTask};
use drive_archiver::task::{Task, TaskState};
use tokio::sync::mpsc;

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

fn rules(min_size_mb: u64) -> RuleSet {
    RuleSet {
        filter_mode: FilterMode::Size,
        min_size_mb,
        before_date: None,
        include_google_docs: true,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn scan_accumulates_across_pages() {
    let mb = 1024 * 1024;
    let mut source = MockRemoteSource::new();
    source
        .expect_list_page()
        .withf(|token, _| token.is_none())
        .times(1)
        .returning(move |_, _| {
            Ok(FilePage {
                files: vec![
                    record("big1.bin", 300 * mb, "application/octet-stream"),
                    record("tiny.bin", 1, "application/octet-stream"),
                ],
                next_page_token: Some("page2".to_string()),
            })
        });
    source
        .expect_list_page()
        .withf(|token, _| token.as_deref() == Some("page2"))
        .times(1)
        .returning(move |_, _| {
            Ok(FilePage {
                files: vec![record("big2.bin", 250 * mb, "application/octet-stream")],
                next_page_token: None,
            })
        });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), rules(200), tx);
    let state = task.run().await;

    assert_eq!(state, TaskState::Completed);
    assert_eq!(task.state(), TaskState::Completed);

    let events = drain(&mut rx);
    let progress: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress { found } => Some(*found),
            _ => None,
        })
        .collect();
    // One progress event per page, running count, pre-filtered.
    assert_eq!(progress, vec![1, 2]);

    let completed = events.iter().find_map(|e| match e {
        ScanEvent::Completed { files } => Some(files.clone()),
        _ => None,
    });
    let names: Vec<String> = completed
        .expect("scan should complete")
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec!["big1.bin", "big2.bin"]);
}

#[tokio::test]
async fn google_docs_survive_the_size_prefilter() {
    let mut source = MockRemoteSource::new();
    source.expect_list_page().times(1).returning(|_, _| {
        Ok(FilePage {
            files: vec![record("Notes", 0, "application/vnd.google-apps.document")],
            next_page_token: None,
        })
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), rules(200), tx);
    assert_eq!(task.run().await, TaskState::Completed);

    let completed = drain(&mut rx).into_iter().find_map(|e| match e {
        ScanEvent::Completed { files } => Some(files),
        _ => None,
    });
    assert_eq!(completed.unwrap().len(), 1);
}

#[tokio::test]
async fn excluded_google_docs_are_dropped_by_the_final_pass() {
    let mut source = MockRemoteSource::new();
    source.expect_list_page().times(1).returning(|_, _| {
        Ok(FilePage {
            files: vec![record("Notes", 0, "application/vnd.google-apps.document")],
            next_page_token: None,
        })
    });

    let mut excluded = rules(200);
    excluded.include_google_docs = false;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), excluded, tx);
    assert_eq!(task.run().await, TaskState::Completed);

    let completed = drain(&mut rx).into_iter().find_map(|e| match e {
        ScanEvent::Completed { files } => Some(files),
        _ => None,
    });
    assert!(completed.unwrap().is_empty());
}

#[tokio::test]
async fn cancellation_before_run_does_no_listing() {
    // No expectations on the mock: any listing call would panic the test.
    let source = MockRemoteSource::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), rules(200), tx);
    task.cancel_flag().request();

    assert_eq!(task.run().await, TaskState::Cancelled);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ScanEvent::Status(s) if s == "Scan cancelled")));
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::Completed { .. })));
}

#[tokio::test]
async fn cancellation_between_pages_stops_listing() {
    // The flag does not exist until the task does, so the page-1 closure picks
    // it out of a slot filled in after construction.
    let slot: Arc<OnceLock<drive_archiver::task::CancellationFlag>> = Arc::new(OnceLock::new());
    let in_page = Arc::clone(&slot);

    let mut source = MockRemoteSource::new();
    source.expect_list_page().times(1).returning(move |_, _| {
        in_page.get().expect("flag installed before run").request();
        Ok(FilePage {
            files: vec![record("big.bin", 300 * 1024 * 1024, "application/octet-stream")],
            next_page_token: Some("page2".to_string()),
        })
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), rules(200), tx);
    slot.set(task.cancel_flag()).ok();

    assert_eq!(task.run().await, TaskState::Cancelled);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ScanEvent::Status(s) if s == "Scan cancelled")));
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::Completed { .. })));
}

#[tokio::test]
async fn listing_error_fails_the_scan() {
    let mut source = MockRemoteSource::new();
    source
        .expect_list_page()
        .times(1)
        .returning(|_, _| Err("boom".into()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut task = ScanTask::new(Arc::new(source), rules(200), tx);

    assert_eq!(task.run().await, TaskState::Failed);

    let failed = drain(&mut rx).into_iter().find_map(|e| match e {
        ScanEvent::Failed { message } => Some(message),
        _ => None,
    });
    assert_eq!(failed.unwrap(), "Failed to list files: boom");
}
