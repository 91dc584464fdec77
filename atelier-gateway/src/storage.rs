//! Object storage uploads for product images, videos and spreadsheets

use async_trait::async_trait;
use atelier_shared::{AtelierError, Result, StorageConfig};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::sync::{Arc, OnceLock};
use url::Url;

/// Accepts bytes at a namespaced path and returns a public URL for them
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<Url>;
}

/// What an uploaded object is used for; decides its folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    ProductImage,
    Video,
    Spreadsheet,
    ProfileImage,
}

impl ObjectKind {
    pub fn folder(&self) -> &'static str {
        match self {
            Self::ProductImage => "products",
            Self::Video => "videos",
            Self::Spreadsheet => "bulk",
            Self::ProfileImage => "profile",
        }
    }
}

/// Storage reached with plain `PUT {upload_url}/{path}`
pub struct HttpObjectStorage {
    client: Client,
    upload_url: String,
    public_url: String,
    api_key: Option<String>,
}

impl HttpObjectStorage {
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        let target = format!("{}/{}", self.upload_url, path);
        tracing::info!("Uploading {} bytes to {}", bytes.len(), target);

        let mut request = self
            .client
            .put(&target)
            .header(CONTENT_TYPE, content_type_for(path))
            .body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            tracing::error!("Upload of {} failed: HTTP {}", path, response.status());
            return Err(AtelierError::Storage(format!(
                "Upload of {path} failed: HTTP {}",
                response.status()
            )));
        }

        Ok(Url::parse(&format!("{}/{}", self.public_url, path))?)
    }
}

/// Uploads designer files under `{namespace}/{designer}/{folder}/`
#[derive(Clone)]
pub struct MediaUploader {
    storage: Arc<dyn ObjectStorage>,
    namespace: String,
}

impl MediaUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    pub async fn upload(
        &self,
        designer_id: &str,
        kind: ObjectKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Url> {
        if bytes.is_empty() {
            return Err(AtelierError::InvalidOperation(format!(
                "{file_name} is empty"
            )));
        }
        let path = object_path(&self.namespace, designer_id, kind, file_name, &bytes);
        self.storage.upload(bytes, &path).await
    }
}

/// Content-addressed object path, so re-uploading the same file is idempotent
pub fn object_path(
    namespace: &str,
    designer_id: &str,
    kind: ObjectKind,
    file_name: &str,
    bytes: &[u8],
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}/{}/{}/{}-{}",
        sanitize(namespace),
        sanitize(designer_id),
        kind.folder(),
        &digest[..12],
        sanitize(file_name)
    )
}

fn sanitize(segment: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars =
        UNSAFE.get_or_init(|| Regex::new(r"(?:[^A-Za-z0-9._-]|\.\.)+").expect("valid pattern"));

    let cleaned = unsafe_chars.replace_all(segment.trim(), "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "csv" => "text/csv",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
