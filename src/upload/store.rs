// # File Store
//
// Authoritative, observable collection of tracked files. Every mutation
// replaces the whole collection atomically and publishes the new snapshot to
// subscribers, so readers never see a partially applied update.

use crate::upload::types::{FileData, TrackedFile, UploadStatus};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::trace;
use uuid::Uuid;

/// Immutable view of the queue at one point in time.
pub type QueueSnapshot = Arc<Vec<TrackedFile>>;

type SubscriberId = u64;

struct StoreInner {
    files: QueueSnapshot,
    subscribers: HashMap<SubscriberId, tokio_mpsc::UnboundedSender<QueueSnapshot>>,
}

/// Injectable state container for tracked files.
///
/// All reads by other components go through `snapshot`/`subscribe`; all
/// writes go through the mutation operations below. Write-backs addressed to
/// an id that has since been removed are dropped silently, which is what
/// lets an in-flight upload finish in the background after its file was
/// removed from the queue.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<Mutex<StoreInner>>,
    next_subscriber_id: Arc<AtomicU64>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                files: Arc::new(Vec::new()),
                subscribers: HashMap::new(),
            })),
            next_subscriber_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Current snapshot of the queue.
    pub fn snapshot(&self) -> QueueSnapshot {
        self.inner.lock().unwrap().files.clone()
    }

    /// Subscribe to queue changes.
    ///
    /// The receiver immediately yields the current snapshot, then one
    /// snapshot per mutation. The subscription is removed automatically
    /// when the receiver is dropped.
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<QueueSnapshot> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.inner.lock().unwrap();
        let _ = tx.send(inner.files.clone());
        inner.subscribers.insert(id, tx);
        rx
    }

    /// Insert validated files as `Idle` with fresh ids.
    ///
    /// Deduplicates only within the incoming batch (not against files
    /// already tracked), so the same image can be re-uploaded in a later
    /// batch. New entries surface at the front of the sequence. Returns the
    /// assigned ids in insertion order.
    pub fn append_accepted(&self, accepted: Vec<FileData>) -> Vec<String> {
        if accepted.is_empty() {
            return Vec::new();
        }

        let mut seen_in_batch = HashSet::new();
        let mut fresh = Vec::new();
        for data in accepted {
            let key = (data.name.clone(), data.size(), data.last_modified);
            if !seen_in_batch.insert(key) {
                continue;
            }
            fresh.push(TrackedFile {
                id: Uuid::new_v4().to_string(),
                data,
                status: UploadStatus::Idle,
                progress: 0,
            });
        }

        let ids: Vec<String> = fresh.iter().map(|f| f.id.clone()).collect();
        trace!("FileStore: appending {} file(s)", fresh.len());

        let mut inner = self.inner.lock().unwrap();
        let mut files = fresh;
        files.extend(inner.files.iter().cloned());
        inner.files = Arc::new(files);
        Self::publish(&mut inner);
        ids
    }

    /// Overwrite a file's progress. No-op when the id is absent. Only valid
    /// while the file is `Pending`; callers must stop reporting once the
    /// status has moved on.
    pub fn update_progress(&self, id: &str, progress: u8) {
        self.mutate_file(id, |file| file.progress = progress.min(100));
    }

    /// Overwrite a file's status. Transitioning back to `Idle` is the retry
    /// trigger and resets progress to 0. No-op when the id is absent.
    pub fn update_status(&self, id: &str, status: UploadStatus) {
        self.mutate_file(id, |file| {
            file.status = status;
            if status == UploadStatus::Idle {
                file.progress = 0;
            }
        });
    }

    /// Drop a file from the queue regardless of its status.
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.files.iter().any(|f| f.id == id) {
            return;
        }
        let files: Vec<TrackedFile> = inner
            .files
            .iter()
            .filter(|f| f.id != id)
            .cloned()
            .collect();
        inner.files = Arc::new(files);
        Self::publish(&mut inner);
    }

    /// Empty the queue.
    pub fn clear(&self) {
        trace!("FileStore: clearing queue");
        let mut inner = self.inner.lock().unwrap();
        inner.files = Arc::new(Vec::new());
        Self::publish(&mut inner);
    }

    fn mutate_file(&self, id: &str, apply: impl FnOnce(&mut TrackedFile)) {
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner.files.iter().position(|f| f.id == id) else {
            return;
        };
        let mut files: Vec<TrackedFile> = inner.files.as_ref().clone();
        apply(&mut files[index]);
        inner.files = Arc::new(files);
        Self::publish(&mut inner);
    }

    fn publish(inner: &mut StoreInner) {
        let snapshot = inner.files.clone();
        // A failed send means the receiver was dropped; forget it.
        inner
            .subscribers
            .retain(|_, tx| tx.send(snapshot.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn data(name: &str) -> FileData {
        FileData {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            last_modified: Some(42),
            bytes: Bytes::from_static(b"png bytes"),
        }
    }

    #[test]
    fn accepted_files_start_idle_with_unique_ids() {
        let store = FileStore::new();
        let ids = store.append_accepted(vec![data("a.png"), data("b.png")]);

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        for file in store.snapshot().iter() {
            assert_eq!(file.status, UploadStatus::Idle);
            assert_eq!(file.progress, 0);
        }
    }

    #[test]
    fn duplicate_candidates_collapse_within_a_batch_but_not_across() {
        let store = FileStore::new();
        let first = store.append_accepted(vec![data("a.png"), data("a.png")]);
        assert_eq!(first.len(), 1);

        let second = store.append_accepted(vec![data("a.png")]);
        assert_eq!(second.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn candidates_with_different_modified_times_are_not_duplicates() {
        let store = FileStore::new();
        let mut later = data("a.png");
        later.last_modified = Some(43);
        let ids = store.append_accepted(vec![data("a.png"), later]);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn newest_batch_surfaces_first() {
        let store = FileStore::new();
        store.append_accepted(vec![data("old.png")]);
        store.append_accepted(vec![data("new.png")]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].data.name, "new.png");
        assert_eq!(snapshot[1].data.name, "old.png");
    }

    #[test]
    fn returning_to_idle_resets_progress() {
        let store = FileStore::new();
        let ids = store.append_accepted(vec![data("a.png")]);

        store.update_status(&ids[0], UploadStatus::Pending);
        store.update_progress(&ids[0], 70);
        store.update_status(&ids[0], UploadStatus::Error);
        assert_eq!(store.snapshot()[0].progress, 70);

        store.update_status(&ids[0], UploadStatus::Idle);
        let file = &store.snapshot()[0];
        assert_eq!(file.status, UploadStatus::Idle);
        assert_eq!(file.progress, 0);
    }

    #[test]
    fn writes_to_removed_ids_are_dropped() {
        let store = FileStore::new();
        let ids = store.append_accepted(vec![data("a.png")]);
        store.remove(&ids[0]);

        store.update_progress(&ids[0], 50);
        store.update_status(&ids[0], UploadStatus::Success);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_the_current_snapshot_then_every_mutation() {
        let store = FileStore::new();
        store.append_accepted(vec![data("a.png")]);

        let mut rx = store.subscribe();
        let initial = rx.recv().await.unwrap();
        assert_eq!(initial.len(), 1);

        store.append_accepted(vec![data("b.png")]);
        let updated = rx.recv().await.unwrap();
        assert_eq!(updated.len(), 2);

        store.clear();
        let cleared = rx.recv().await.unwrap();
        assert!(cleared.is_empty());
    }
}
