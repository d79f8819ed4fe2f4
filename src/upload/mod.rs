// # Upload Module
//
// Headless upload orchestration with focused, testable components:
//
// - **validator**: Classifies intake candidates against the size/type policy
// - **store**: Observable queue of tracked files (single source of truth)
// - **driver**: Watches the queue and drives concurrent uploads
// - **view_model**: Aggregate and per-file presentation derivations
// - **notices**: Transient intake-rejection banners
// - **service**: Wires the pieces together behind a handle
//
// Public API:
// - `UploadService` / `UploadHandle`: start and interact with the core
// - `FileStore`: injectable state container
// - `UploadStatus`, `TrackedFile`, `FileData`, `ClipboardItem`, `UploadEvent`

mod driver;
mod events;
mod notices;
mod service;
mod store;
pub(crate) mod types;
mod validator;
mod view_model;

pub use events::UploadEventsHandle;
pub use notices::RejectionNotices;
pub use service::{IntakeSummary, UploadHandle, UploadService};
pub use store::{FileStore, QueueSnapshot};
pub use types::{ClipboardItem, FileData, TrackedFile, UploadEvent, UploadStatus};
pub use validator::{partition, IntakePolicy, Rejection, RejectionReason};
pub use view_model::{FileCardView, StatusColor, UploadOverview};
