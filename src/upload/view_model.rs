// Pure derivations from a queue snapshot. Nothing here performs I/O or
// holds state of its own; the presentation layer recomputes these on every
// snapshot it receives.

use crate::upload::types::{TrackedFile, UploadStatus};

const DISPLAY_NAME_MAX_CHARS: usize = 30;

/// Aggregate state derived from the whole queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOverview {
    pub total_files: usize,
    /// Mean completion over all tracked files, in [0, 100]. Reads 100 only
    /// when the queue is non-empty and every file succeeded.
    pub overall_progress: u8,
    pub has_in_progress: bool,
    pub all_succeeded: bool,
}

impl UploadOverview {
    pub fn from_snapshot(files: &[TrackedFile]) -> Self {
        let total_files = files.len();
        let has_in_progress = files
            .iter()
            .any(|f| matches!(f.status, UploadStatus::Idle | UploadStatus::Pending));
        let all_succeeded =
            total_files > 0 && files.iter().all(|f| f.status == UploadStatus::Success);

        let overall_progress = if total_files == 0 {
            0
        } else {
            let sum: u32 = files
                .iter()
                .map(|f| match f.status {
                    UploadStatus::Success => 100u32,
                    // A file that has not succeeded never counts as fully
                    // done, even when its request body was fully sent before
                    // the endpoint rejected it.
                    _ => u32::from(f.progress.min(99)),
                })
                .sum();
            (sum / total_files as u32) as u8
        };

        Self {
            total_files,
            overall_progress,
            has_in_progress,
            all_succeeded,
        }
    }

    /// The overall progress bar is shown while anything is still waiting or
    /// uploading.
    pub fn show_overall_progress(&self) -> bool {
        self.has_in_progress
    }

    /// Clear-all is only offered once every tracked file has succeeded.
    pub fn show_clear_all(&self) -> bool {
        self.all_succeeded
    }
}

/// Progress-bar color for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Error,
    Info,
    Inherit,
}

/// Presentation state for a single file's progress card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCardView {
    pub progress: u8,
    pub status_color: StatusColor,
    pub is_visible: bool,
    pub display_name: String,
    pub status_message: String,
}

impl FileCardView {
    pub fn for_file(file: &TrackedFile) -> Self {
        Self {
            progress: match file.status {
                UploadStatus::Success => 100,
                _ => file.progress,
            },
            status_color: match file.status {
                UploadStatus::Error => StatusColor::Error,
                UploadStatus::Pending => StatusColor::Info,
                _ => StatusColor::Inherit,
            },
            // Idle files exist only to trigger an upload; they are not shown.
            is_visible: file.status != UploadStatus::Idle,
            display_name: truncate_name(&file.data.name, DISPLAY_NAME_MAX_CHARS),
            status_message: status_message(file.status).to_string(),
        }
    }
}

fn status_message(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Success => "Upload successful!",
        UploadStatus::Error => "Upload failed. Click retry to upload again.",
        UploadStatus::Pending => "Uploading... ",
        UploadStatus::Idle => "Preparing to upload...",
    }
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let head: String = name.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
