//! Media host abstraction.
//!
//! Image uploads are forwarded to an external host that stores the bytes
//! and hands back a public URL. [`CloudinaryHost`] is the production
//! backend; tests substitute their own [`MediaHost`].

mod cloudinary;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::MediaError;

pub use cloudinary::{sign_params, CloudinaryCredentials, CloudinaryHost, DEFAULT_CLOUDINARY_ENDPOINT};

/// A file received from a client, ready to forward.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Client-side file name
    pub file_name: String,

    /// MIME type reported by the client, if any
    pub content_type: Option<String>,

    /// Raw file contents
    pub data: Bytes,
}

/// Where the media host put an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    /// Public HTTPS URL of the stored file
    pub url: String,

    /// Host-side identifier of the stored file
    pub public_id: String,
}

/// Something that accepts a file and returns where it now lives.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError>;
}
