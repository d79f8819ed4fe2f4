// # Upload Driver
//
// Bridges the file store to the media-storage endpoint. Observes queue
// snapshots, admits freshly idle files as a batch, and drives every member's
// upload concurrently while writing progress and outcomes back to the store.
//
// Admission is edge-triggered AND single-flight: only ids that were not idle
// in the previous observation are admitted, and a batch is driven to
// completion before the next observation is acted on. Dropping either half
// of that contract re-issues requests for files already mid-flight or
// starves files that arrived during a slow batch.

use crate::media_storage::{MediaStorage, MediaStorageError, ProgressFn};
use crate::upload::store::FileStore;
use crate::upload::types::{TrackedFile, UploadEvent, UploadStatus};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{info, warn};

pub struct UploadDriver {
    store: FileStore,
    storage: Arc<dyn MediaStorage>,
    events_tx: tokio_mpsc::UnboundedSender<UploadEvent>,
}

impl UploadDriver {
    pub fn new(
        store: FileStore,
        storage: Arc<dyn MediaStorage>,
        events_tx: tokio_mpsc::UnboundedSender<UploadEvent>,
    ) -> Self {
        Self {
            store,
            storage,
            events_tx,
        }
    }

    /// Process queue snapshots until the store is dropped.
    pub async fn run(self) {
        let mut snapshots = self.store.subscribe();
        let mut seen_idle: HashSet<String> = HashSet::new();

        info!("UploadDriver: worker started");
        while let Some(snapshot) = snapshots.recv().await {
            let admitted = fresh_idle_ids(&mut seen_idle, &snapshot);
            if admitted.is_empty() {
                continue;
            }

            // The batch is awaited inline, so at most one batch is ever
            // outstanding; snapshots that arrive meanwhile queue up and are
            // diffed once the batch resolves.
            if let Err(error) = self.run_batch(&admitted).await {
                warn!("UploadDriver: batch refused: {}", error);
                // The members never left Idle. Forget them so the next queue
                // change offers them for admission again.
                for id in &admitted {
                    seen_idle.remove(id);
                }
                let _ = self.events_tx.send(UploadEvent::BatchFailed {
                    error: error.to_string(),
                });
            }
        }
        info!("UploadDriver: snapshot channel closed, exiting");
    }

    async fn run_batch(&self, admitted: &[String]) -> Result<(), MediaStorageError> {
        // Missing endpoint configuration fails the whole batch before any
        // file is touched.
        self.storage.ensure_configured()?;

        // Re-check membership against the live queue: anything removed or no
        // longer idle since admission is skipped.
        let snapshot = self.store.snapshot();
        let members: Vec<TrackedFile> = snapshot
            .iter()
            .filter(|f| f.status == UploadStatus::Idle && admitted.contains(&f.id))
            .cloned()
            .collect();
        if members.is_empty() {
            return Ok(());
        }

        let member_ids: Vec<String> = members.iter().map(|f| f.id.clone()).collect();
        info!("UploadDriver: starting batch of {} file(s)", members.len());
        let _ = self.events_tx.send(UploadEvent::BatchStarted {
            file_ids: member_ids.clone(),
        });

        for file in &members {
            self.store.update_status(&file.id, UploadStatus::Pending);
        }

        let mut uploads = FuturesUnordered::new();
        for file in members {
            let store = self.store.clone();
            let storage = Arc::clone(&self.storage);
            uploads.push(async move {
                let progress_store = store.clone();
                let progress_id = file.id.clone();
                let on_progress: ProgressFn = Box::new(move |percent| {
                    progress_store.update_progress(&progress_id, percent);
                });

                match storage.upload(&file.data, on_progress).await {
                    Ok(()) => store.update_status(&file.id, UploadStatus::Success),
                    Err(error) => {
                        warn!(
                            "UploadDriver: upload failed for {}: {}",
                            file.data.name, error
                        );
                        store.update_status(&file.id, UploadStatus::Error);
                    }
                }
            });
        }

        // One member failing never aborts its siblings; the batch resolves
        // once every request has resolved.
        while uploads.next().await.is_some() {}

        let _ = self.events_tx.send(UploadEvent::BatchCompleted {
            file_ids: member_ids,
        });
        Ok(())
    }
}

/// Set-difference admission check.
///
/// Returns ids that are idle now but were not idle in the previous
/// observation, and remembers the current idle set. Files already dispatched
/// stay out of the result even when stale snapshots still show them idle; a
/// file that leaves `Idle` and comes back (retry) reads as fresh again.
fn fresh_idle_ids(seen_idle: &mut HashSet<String>, snapshot: &[TrackedFile]) -> Vec<String> {
    let idle_now: HashSet<String> = snapshot
        .iter()
        .filter(|f| f.status == UploadStatus::Idle)
        .map(|f| f.id.clone())
        .collect();

    let fresh = snapshot
        .iter()
        .filter(|f| f.status == UploadStatus::Idle && !seen_idle.contains(&f.id))
        .map(|f| f.id.clone())
        .collect();

    *seen_idle = idle_now;
    fresh
}
