// # Upload Service - Orchestrator
//
// Wires the focused pieces together: the validator classifies candidates,
// the store tracks them, the driver uploads them, and the handle is the one
// surface the presentation layer talks to.

use crate::media_storage::MediaStorage;
use crate::upload::driver::UploadDriver;
use crate::upload::events::UploadEventsHandle;
use crate::upload::notices::RejectionNotices;
use crate::upload::store::{FileStore, QueueSnapshot};
use crate::upload::types::{ClipboardItem, FileData, UploadEvent, UploadStatus};
use crate::upload::validator::{self, IntakePolicy};
use crate::upload::view_model::UploadOverview;
use std::sync::Arc;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

pub struct UploadService;

impl UploadService {
    /// Start the upload driver and event fan-out on the shared runtime and
    /// return the handle for interacting with the core.
    ///
    /// The store is injected rather than owned so that other consumers (and
    /// tests) can observe or pre-seed the same queue.
    pub fn start(
        runtime_handle: tokio::runtime::Handle,
        store: FileStore,
        storage: Arc<dyn MediaStorage>,
        policy: IntakePolicy,
    ) -> UploadHandle {
        let (events_tx, events_rx) = tokio_mpsc::unbounded_channel();

        let driver = UploadDriver::new(store.clone(), storage, events_tx);
        runtime_handle.spawn(driver.run());

        let events = UploadEventsHandle::new(events_rx, runtime_handle.clone());
        let notices = RejectionNotices::new(runtime_handle);

        UploadHandle {
            store,
            policy,
            notices,
            events,
        }
    }
}

/// What became of one intake call.
#[derive(Debug, Clone, Default)]
pub struct IntakeSummary {
    pub accepted_ids: Vec<String>,
    pub rejection_messages: Vec<String>,
}

/// Handle for feeding candidates in and observing queue and upload state.
#[derive(Clone)]
pub struct UploadHandle {
    store: FileStore,
    policy: IntakePolicy,
    notices: RejectionNotices,
    events: UploadEventsHandle,
}

impl UploadHandle {
    /// Validate and enqueue candidates from a drop or file-picker selection.
    ///
    /// Accepted files enter the queue as `Idle`, where the driver picks them
    /// up; rejections become transient banner messages. Empty batches are
    /// ignored.
    pub fn intake(&self, candidates: Vec<FileData>) -> IntakeSummary {
        if candidates.is_empty() {
            return IntakeSummary::default();
        }

        let (accepted, rejections) = validator::partition(candidates, &self.policy);
        let rejection_messages: Vec<String> = rejections
            .iter()
            .map(|r| r.message(&self.policy))
            .collect();

        let accepted_ids = self.store.append_accepted(accepted);
        if !accepted_ids.is_empty() {
            info!(
                "UploadHandle: accepted {} file(s), rejected {}",
                accepted_ids.len(),
                rejection_messages.len()
            );
        }
        if !rejection_messages.is_empty() {
            self.notices.publish(rejection_messages.clone());
        }

        IntakeSummary {
            accepted_ids,
            rejection_messages,
        }
    }

    /// Clipboard intake. File-kind items go through exactly the same
    /// validation, and produce exactly the same messages, as dropped files;
    /// everything else on the clipboard is ignored.
    pub fn intake_clipboard(&self, items: Vec<ClipboardItem>) -> IntakeSummary {
        let candidates: Vec<FileData> = items
            .into_iter()
            .filter_map(|item| match item {
                ClipboardItem::File(data) => Some(data),
                ClipboardItem::Text(_) => None,
            })
            .collect();
        self.intake(candidates)
    }

    /// Send a failed file back through the queue. Re-entering `Idle` resets
    /// its progress, and the driver re-admits it on its next observation.
    pub fn retry(&self, id: &str) {
        self.store.update_status(id, UploadStatus::Idle);
    }

    /// Drop a file regardless of status. An upload already in flight for it
    /// finishes in the background and its result is discarded.
    pub fn remove(&self, id: &str) {
        self.store.remove(id);
    }

    /// Empty the queue. Meant to be offered to the user only once every
    /// tracked file has succeeded (see `UploadOverview::show_clear_all`).
    pub fn clear_all(&self) {
        self.store.clear();
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<QueueSnapshot> {
        self.store.subscribe()
    }

    pub fn subscribe_events(&self) -> tokio_mpsc::UnboundedReceiver<UploadEvent> {
        self.events.subscribe()
    }

    pub fn overview(&self) -> UploadOverview {
        UploadOverview::from_snapshot(&self.snapshot())
    }

    pub fn rejection_messages(&self) -> Vec<String> {
        self.notices.current()
    }

    pub fn dismiss_rejection(&self, index: usize) {
        self.notices.dismiss(index);
    }
}
