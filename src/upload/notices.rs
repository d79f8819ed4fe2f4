use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long a published batch of rejection messages stays visible.
const EXPIRY: Duration = Duration::from_secs(5);

/// Transient intake-rejection banners.
///
/// Publishing a batch of messages replaces the previous batch and restarts
/// the expiry clock; whatever is still showing after five seconds is cleared
/// by a scoped, cancellable delayed task. Individual messages can be
/// dismissed by index before expiry. None of this feeds back into the queue
/// state machine.
#[derive(Clone)]
pub struct RejectionNotices {
    messages: Arc<Mutex<Vec<String>>>,
    expiry_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    runtime_handle: tokio::runtime::Handle,
}

impl RejectionNotices {
    pub fn new(runtime_handle: tokio::runtime::Handle) -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            expiry_task: Arc::new(Mutex::new(None)),
            runtime_handle,
        }
    }

    /// Replace the visible messages and schedule their expiry.
    pub fn publish(&self, new_messages: Vec<String>) {
        if new_messages.is_empty() {
            return;
        }
        *self.messages.lock().unwrap() = new_messages;

        let messages = self.messages.clone();
        let task = self.runtime_handle.spawn(async move {
            tokio::time::sleep(EXPIRY).await;
            messages.lock().unwrap().clear();
        });

        if let Some(previous) = self.expiry_task.lock().unwrap().replace(task) {
            previous.abort();
        }
    }

    /// Dismiss a single message before it expires. Out-of-range indexes are
    /// ignored.
    pub fn dismiss(&self, index: usize) {
        let mut messages = self.messages.lock().unwrap();
        if index < messages.len() {
            messages.remove(index);
        }
    }

    pub fn current(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}
