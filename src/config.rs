use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_UPLOAD_TAG: &str = "picsee_tag";

/// Cloudinary endpoint configuration.
///
/// Uploads go to `{api_url}/{cloud_name}/image/upload` with the fixed
/// `upload_preset` and `tag` form fields. `cloud_name` and `upload_preset`
/// have no usable defaults and must be provided by the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub api_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub tag: String,
}

impl CloudinaryConfig {
    /// Load configuration from environment variables, pulling in a `.env`
    /// file when one is present.
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_ok() {
            debug!("Config: loaded .env file");
        }

        Self {
            api_url: std::env::var("PICSEE_CLOUDINARY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            cloud_name: std::env::var("PICSEE_CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            upload_preset: std::env::var("PICSEE_CLOUDINARY_UPLOAD_PRESET").unwrap_or_default(),
            tag: std::env::var("PICSEE_UPLOAD_TAG")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_TAG.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.trim().is_empty() {
            return Err("API URL cannot be empty".to_string());
        }
        if self.cloud_name.trim().is_empty() {
            return Err("Cloud name cannot be empty".to_string());
        }
        if self.upload_preset.trim().is_empty() {
            return Err("Upload preset cannot be empty".to_string());
        }
        Ok(())
    }
}
