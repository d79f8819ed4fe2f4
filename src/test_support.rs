// Test support utilities for both unit and integration tests

use crate::media_storage::{MediaStorage, MediaStorageError, ProgressFn};
use crate::upload::types::FileData;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// Mock media storage for testing
///
/// Records uploads in memory instead of talking to the network. Individual
/// files can be scripted to fail by name, the endpoint can be marked
/// unconfigured, and all in-flight uploads can be held open to keep a batch
/// outstanding while a test mutates the queue.
pub struct MockMediaStorage {
    uploaded: Mutex<Vec<String>>,
    fail_names: Mutex<HashSet<String>>,
    configured: AtomicBool,
    hold_tx: watch::Sender<bool>,
}

impl Default for MockMediaStorage {
    fn default() -> Self {
        let (hold_tx, _) = watch::channel(false);
        MockMediaStorage {
            uploaded: Mutex::new(Vec::new()),
            fail_names: Mutex::new(HashSet::new()),
            configured: AtomicBool::new(true),
            hold_tx,
        }
    }
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the named file's next upload to fail.
    pub fn fail_for(&self, name: &str) {
        self.fail_names.lock().unwrap().insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_names.lock().unwrap().clear();
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    /// Keep every upload in flight until `release_uploads`.
    pub fn hold_uploads(&self) {
        self.hold_tx.send_replace(true);
    }

    pub fn release_uploads(&self) {
        self.hold_tx.send_replace(false);
    }

    /// Names of files whose upload requests ran to completion, in completion
    /// order (including scripted failures).
    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaStorage for MockMediaStorage {
    fn ensure_configured(&self) -> Result<(), MediaStorageError> {
        if self.configured.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MediaStorageError::Config(
                "Cloud name cannot be empty".to_string(),
            ))
        }
    }

    async fn upload(
        &self,
        file: &FileData,
        on_progress: ProgressFn,
    ) -> Result<(), MediaStorageError> {
        let mut hold_rx = self.hold_tx.subscribe();
        let _ = hold_rx.wait_for(|held| !held).await;

        on_progress(50);
        on_progress(100);
        self.uploaded.lock().unwrap().push(file.name.clone());

        if self.fail_names.lock().unwrap().contains(&file.name) {
            return Err(MediaStorageError::Rejected(format!(
                "endpoint returned status 400 for {}",
                file.name
            )));
        }
        Ok(())
    }
}
