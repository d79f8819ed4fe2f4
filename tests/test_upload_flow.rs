#![cfg(feature = "test-utils")]

mod support;

use std::sync::Arc;
use std::time::Duration;

use picsee::test_support::MockMediaStorage;
use picsee::upload::{FileStore, IntakePolicy, UploadEvent, UploadHandle, UploadService, UploadStatus};
use support::{image_file, tracing_init};

fn start(storage: Arc<MockMediaStorage>) -> UploadHandle {
    UploadService::start(
        tokio::runtime::Handle::current(),
        FileStore::new(),
        storage,
        IntakePolicy::default(),
    )
}

async fn next_event(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<UploadEvent>,
) -> UploadEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an upload event")
        .expect("event channel closed")
}

#[tokio::test]
async fn accepted_files_upload_and_clear_all_empties_the_queue() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    let summary = handle.intake(vec![
        image_file("a.jpg", "image/jpeg", 1024),
        image_file("b.png", "image/png", 2048),
    ]);
    assert_eq!(summary.accepted_ids.len(), 2);
    assert!(summary.rejection_messages.is_empty());

    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchStarted { .. }
    ));
    match next_event(&mut events).await {
        UploadEvent::BatchCompleted { file_ids } => assert_eq!(file_ids.len(), 2),
        other => panic!("unexpected event: {other:?}"),
    }

    let snapshot = handle.snapshot();
    assert!(snapshot
        .iter()
        .all(|f| f.status == UploadStatus::Success && f.progress == 100));

    let overview = handle.overview();
    assert_eq!(overview.overall_progress, 100);
    assert!(overview.all_succeeded);
    assert!(overview.show_clear_all());

    handle.clear_all();
    assert!(handle.snapshot().is_empty());

    // An emptied queue offers the driver nothing further.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn one_failure_does_not_abort_sibling_uploads() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    storage.fail_for("bad.png");
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    handle.intake(vec![
        image_file("good.jpg", "image/jpeg", 512),
        image_file("bad.png", "image/png", 512),
    ]);

    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchStarted { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));

    let snapshot = handle.snapshot();
    let good = snapshot.iter().find(|f| f.data.name == "good.jpg").unwrap();
    let bad = snapshot.iter().find(|f| f.data.name == "bad.png").unwrap();
    assert_eq!(good.status, UploadStatus::Success);
    assert_eq!(bad.status, UploadStatus::Error);

    let overview = handle.overview();
    assert!(!overview.all_succeeded);
    assert!(overview.overall_progress < 100);
}

#[tokio::test]
async fn retry_resets_progress_and_readmits_the_file() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    storage.fail_for("flaky.png");
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    let summary = handle.intake(vec![image_file("flaky.png", "image/png", 256)]);
    let id = summary.accepted_ids[0].clone();

    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchStarted { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));
    assert_eq!(handle.snapshot()[0].status, UploadStatus::Error);

    storage.clear_failures();
    handle.retry(&id);

    match next_event(&mut events).await {
        UploadEvent::BatchStarted { file_ids } => assert_eq!(file_ids, vec![id.clone()]),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));

    let file = &handle.snapshot()[0];
    assert_eq!(file.status, UploadStatus::Success);
    assert_eq!(file.progress, 100);
    assert_eq!(storage.uploaded_names(), vec!["flaky.png", "flaky.png"]);
}

#[tokio::test]
async fn only_one_batch_is_outstanding_and_no_duplicates_are_issued() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    storage.hold_uploads();
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    handle.intake(vec![image_file("a.jpg", "image/jpeg", 64)]);
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchStarted { .. }
    ));

    // Files arriving while the batch is outstanding wait for it to resolve.
    let second = handle.intake(vec![image_file("b.png", "image/png", 64)]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());

    storage.release_uploads();
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));

    match next_event(&mut events).await {
        UploadEvent::BatchStarted { file_ids } => {
            assert_eq!(file_ids, second.accepted_ids);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));

    // Exactly one request per file, ever.
    assert_eq!(storage.uploaded_names(), vec!["a.jpg", "b.png"]);
    assert!(handle
        .snapshot()
        .iter()
        .all(|f| f.status == UploadStatus::Success));
}

#[tokio::test]
async fn missing_configuration_fails_the_batch_before_any_upload() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    storage.set_configured(false);
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    handle.intake(vec![image_file("a.jpg", "image/jpeg", 128)]);

    match next_event(&mut events).await {
        UploadEvent::BatchFailed { error } => {
            assert!(error.contains("configuration error"), "got: {error}");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(storage.uploaded_names().is_empty());
    assert!(handle
        .snapshot()
        .iter()
        .all(|f| f.status == UploadStatus::Idle && f.progress == 0));

    // Once configured, the next queue change offers the parked file again.
    storage.set_configured(true);
    handle.intake(vec![image_file("b.png", "image/png", 128)]);

    match next_event(&mut events).await {
        UploadEvent::BatchStarted { file_ids } => assert_eq!(file_ids.len(), 2),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));
    assert!(handle
        .snapshot()
        .iter()
        .all(|f| f.status == UploadStatus::Success));
}

#[tokio::test]
async fn removing_a_file_mid_flight_discards_its_result() {
    tracing_init();
    let storage = Arc::new(MockMediaStorage::new());
    storage.hold_uploads();
    let handle = start(storage.clone());
    let mut events = handle.subscribe_events();

    let summary = handle.intake(vec![image_file("a.jpg", "image/jpeg", 64)]);
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchStarted { .. }
    ));

    handle.remove(&summary.accepted_ids[0]);
    assert!(handle.snapshot().is_empty());

    storage.release_uploads();
    assert!(matches!(
        next_event(&mut events).await,
        UploadEvent::BatchCompleted { .. }
    ));

    // The request ran to completion in the background; its write-back was
    // dropped along with the file.
    assert_eq!(storage.uploaded_names(), vec!["a.jpg"]);
    assert!(handle.snapshot().is_empty());
}
