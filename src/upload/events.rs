use crate::upload::types::UploadEvent;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::trace;

type SubscriptionId = u64;

/// Broadcasts driver batch events to any number of subscribers.
#[derive(Clone)]
pub struct UploadEventsHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, tokio_mpsc::UnboundedSender<UploadEvent>>>>,
    next_id: Arc<AtomicU64>,
}

impl UploadEventsHandle {
    /// Create the handle and spawn the background task that fans incoming
    /// events out to subscribers.
    pub fn new(
        mut events_rx: tokio_mpsc::UnboundedReceiver<UploadEvent>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<
            Mutex<HashMap<SubscriptionId, tokio_mpsc::UnboundedSender<UploadEvent>>>,
        > = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(event) = events_rx.recv().await {
                // A failed send means the receiver was dropped; forget it.
                subscriptions_clone
                    .lock()
                    .unwrap()
                    .retain(|_, tx| tx.send(event.clone()).is_ok());
            }
            trace!("UploadEventsHandle: channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to batch events. The subscription is removed automatically
    /// when the receiver is dropped.
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<UploadEvent> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.lock().unwrap().insert(id, tx);
        rx
    }
}
