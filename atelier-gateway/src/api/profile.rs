//! Designer profile

use super::segment;
use crate::dispatcher::ApiClient;
use crate::storage::{MediaUploader, ObjectKind};
use atelier_shared::{DataResponse, DesignerProfile, ProfileUpdate, Result};
use std::sync::Arc;

pub struct ProfileApi {
    api: Arc<ApiClient>,
}

impl ProfileApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn get(&self) -> Result<DesignerProfile> {
        let designer_id = self.api.designer_id()?;
        let response: DataResponse<DesignerProfile> = self
            .api
            .get(&format!("/designer/{}", segment(&designer_id)?))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn update(&self, update: &ProfileUpdate) -> Result<DesignerProfile> {
        let designer_id = self.api.designer_id()?;
        let response: DataResponse<DesignerProfile> = self
            .api
            .put(&format!("/designer/{}", segment(&designer_id)?), update)
            .await?;
        Ok(response.into_inner())
    }

    /// Upload a new logo and point the profile at it
    pub async fn update_logo(
        &self,
        uploader: &MediaUploader,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DesignerProfile> {
        let designer_id = self.api.designer_id()?;
        let url = uploader
            .upload(&designer_id, ObjectKind::ProfileImage, file_name, bytes)
            .await?;
        let update = ProfileUpdate {
            logo_url: Some(url.to_string()),
            ..Default::default()
        };
        self.update(&update).await
    }
}
