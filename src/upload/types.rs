use bytes::Bytes;

/// Per-file lifecycle state.
///
/// `Idle` is both the initial state and the re-entry point for retries: the
/// driver treats every observed `Idle` record as "needs upload", whether it
/// is brand-new or was sent back from `Error` by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Opaque handle to a candidate file's metadata and raw content.
///
/// Cloning is cheap; the underlying bytes are shared, so the queue holds a
/// reference to the payload rather than a copy.
#[derive(Debug, Clone)]
pub struct FileData {
    pub name: String,
    /// MIME type as reported by the candidate source (e.g. "image/png").
    pub mime_type: String,
    /// Milliseconds since the epoch, when the source exposes it.
    pub last_modified: Option<u64>,
    pub bytes: Bytes,
}

impl FileData {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A file tracked by the queue from intake through upload completion.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    /// Stable unique id assigned at intake; never reused, even when
    /// name and size collide across batches.
    pub id: String,
    pub data: FileData,
    pub status: UploadStatus,
    /// Percentage in [0, 100]; meaningful while `Pending`, reset to 0 when
    /// the file re-enters `Idle` for a retry.
    pub progress: u8,
}

/// Entry lifted off the system clipboard. Only file items feed the intake
/// path; everything else on the clipboard is ignored.
#[derive(Debug, Clone)]
pub enum ClipboardItem {
    File(FileData),
    Text(String),
}

/// Batch lifecycle updates emitted by the upload driver.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    BatchStarted { file_ids: Vec<String> },
    BatchCompleted { file_ids: Vec<String> },
    BatchFailed { error: String },
}
