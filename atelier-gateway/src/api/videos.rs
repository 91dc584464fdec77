//! Product-tagged content videos

use super::segment;
use crate::dispatcher::ApiClient;
use crate::storage::{MediaUploader, ObjectKind};
use atelier_shared::{
    AtelierError, ContentVideo, DataResponse, ListResponse, NewContentVideo, Result,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Metadata for a video upload
#[derive(Debug, Clone, Default)]
pub struct VideoUpload {
    pub title: String,
    pub description: Option<String>,
    pub product_ids: Vec<String>,
}

pub struct VideosApi {
    api: Arc<ApiClient>,
}

impl VideosApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<ContentVideo>> {
        let designer_id = self.api.designer_id()?;
        let response: ListResponse<ContentVideo> = self
            .api
            .get(&format!("/content-video/designer/{}", segment(&designer_id)?))
            .await?;
        Ok(response.into_vec())
    }

    /// Upload the video file, then publish it tagged with the given products
    pub async fn upload(
        &self,
        uploader: &MediaUploader,
        file_name: &str,
        bytes: Vec<u8>,
        meta: VideoUpload,
    ) -> Result<ContentVideo> {
        if meta.title.trim().is_empty() {
            return Err(AtelierError::InvalidOperation(
                "a video needs a title".to_string(),
            ));
        }
        for product_id in &meta.product_ids {
            segment(product_id)?;
        }
        let designer_id = self.api.designer_id()?;

        let video_url = uploader
            .upload(&designer_id, ObjectKind::Video, file_name, bytes)
            .await?;

        let body = NewContentVideo {
            designer_id,
            title: meta.title.trim().to_string(),
            description: meta.description,
            video_url: video_url.to_string(),
            product_ids: meta.product_ids,
        };
        let response: DataResponse<ContentVideo> =
            self.api.post("/content-video/create", &body).await?;
        let video = response.into_inner();
        info!("Published video {} ({})", video.title, video.id);
        Ok(video)
    }

    pub async fn delete(&self, video_id: &str) -> Result<Value> {
        self.api
            .delete(&format!("/content-video/{}", segment(video_id)?))
            .await
    }
}
