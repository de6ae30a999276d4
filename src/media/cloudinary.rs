//! Cloudinary signed uploads.
//!
//! Uploads go to `POST {endpoint}/v1_1/{cloud_name}/image/upload` as a
//! multipart form carrying the file, the API key, a unix timestamp and a
//! signature. The signature is the hex SHA-1 of the signed parameters
//! (sorted `key=value` pairs joined by `&`) with the API secret appended.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use sha1_smol::Sha1;
use tracing::{debug, info};

use crate::error::MediaError;

use super::{MediaHost, MediaUpload, UploadedMedia};

/// Public Cloudinary API endpoint.
pub const DEFAULT_CLOUDINARY_ENDPOINT: &str = "https://api.cloudinary.com";

/// Account credentials for signed uploads.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[redacted]")
            .finish()
    }
}

/// Signature over the given upload parameters.
///
/// Parameters are sorted by name before signing, so callers may pass them in
/// any order.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.digest().bytes())
}

/// Media host backed by a Cloudinary account.
#[derive(Clone)]
pub struct CloudinaryHost {
    client: Client,
    endpoint: String,
    credentials: CloudinaryCredentials,
}

impl CloudinaryHost {
    pub fn new(client: Client, endpoint: &str, credentials: CloudinaryCredentials) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.endpoint, self.credentials.cloud_name
        )
    }

    async fn upload_at(
        &self,
        upload: MediaUpload,
        timestamp: i64,
    ) -> Result<UploadedMedia, MediaError> {
        let timestamp = timestamp.to_string();
        let signature = sign_params(&[("timestamp", &timestamp)], &self.credentials.api_secret);

        let size = upload.data.len();
        let file_part = || Part::bytes(upload.data.to_vec()).file_name(upload.file_name.clone());
        let part = match upload.content_type.as_deref() {
            Some(content_type) => file_part().mime_str(content_type).unwrap_or_else(|e| {
                debug!(content_type, error = %e, "Dropping unparseable content type");
                file_part()
            }),
            None => file_part(),
        };

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        debug!(file = %upload.file_name, size, "Uploading image");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Connection(e.to_string()))?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|v| v["error"]["message"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Upload failed with status {}", status));
            return Err(MediaError::Upstream(message));
        }

        let parsed = parsed
            .ok_or_else(|| MediaError::Upstream("Upload response was not JSON".to_string()))?;
        let field = |name: &str| {
            parsed[name]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| MediaError::Upstream(format!("Upload response missing {}", name)))
        };

        let uploaded = UploadedMedia {
            url: field("secure_url")?,
            public_id: field("public_id")?,
        };
        info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        self.upload_at(upload, Utc::now().timestamp()).await
    }
}
