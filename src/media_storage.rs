// # Media Storage
//
// HTTP seam between the upload driver and the remote media endpoint. The
// endpoint is an opaque collaborator: a multipart POST per file, any 2xx is
// success, the response body is not inspected further.

use crate::config::CloudinaryConfig;
use crate::upload::types::FileData;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use thiserror::Error;
use tracing::debug;

/// Bytes pulled off the payload per body chunk; each chunk advances the
/// progress callback.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum MediaStorageError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// Reports fractional upload completion scaled to [0, 100].
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// Media endpoint operations (allows mocking for tests).
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Cheap preflight check. A failure here must refuse the whole batch
    /// before any request is issued.
    fn ensure_configured(&self) -> Result<(), MediaStorageError>;

    /// Upload one file, reporting progress while the body streams out.
    async fn upload(&self, file: &FileData, on_progress: ProgressFn)
        -> Result<(), MediaStorageError>;
}

/// Production client for the hosted media endpoint.
pub struct HttpMediaStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl HttpMediaStorage {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Multipart file part that counts bytes as the transport pulls them and
    /// reports the running percentage. Progress is only reported while the
    /// total length is computable (non-zero).
    fn progress_part(file: &FileData, on_progress: ProgressFn) -> Result<Part, MediaStorageError> {
        let total = file.bytes.len();
        let mut sent = 0usize;

        let stream = futures::stream::iter(chunked(&file.bytes)).map(move |chunk| {
            sent += chunk.len();
            if total > 0 {
                let percent = ((sent as f64 / total as f64) * 100.0).round() as u8;
                on_progress(percent);
            }
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total as u64)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        Ok(part)
    }
}

#[async_trait::async_trait]
impl MediaStorage for HttpMediaStorage {
    fn ensure_configured(&self) -> Result<(), MediaStorageError> {
        self.config.validate().map_err(MediaStorageError::Config)
    }

    async fn upload(
        &self,
        file: &FileData,
        on_progress: ProgressFn,
    ) -> Result<(), MediaStorageError> {
        self.ensure_configured()?;

        let url = self.upload_url();
        debug!(
            "HttpMediaStorage: uploading {} ({} bytes) to {}",
            file.name,
            file.bytes.len(),
            url
        );

        let form = Form::new()
            .part("file", Self::progress_part(file, on_progress)?)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("tags", self.config.tag.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(MediaStorageError::Rejected(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        debug!("HttpMediaStorage: uploaded {}", file.name);
        Ok(())
    }
}

fn chunked(bytes: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + UPLOAD_CHUNK_SIZE).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}
