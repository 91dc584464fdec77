//! Product catalogue operations

use super::segment;
use crate::dispatcher::{ApiClient, RequestOptions};
use crate::storage::{MediaUploader, ObjectKind};
use atelier_shared::{
    BulkImportReport, BulkImportRequest, DataResponse, ListResponse, Product, ProductDraft,
    Result, Variant,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct VariantsBody<'a> {
    variants: &'a [Variant],
}

pub struct ProductsApi {
    api: Arc<ApiClient>,
}

impl ProductsApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// All products of the logged-in designer
    pub async fn list(&self) -> Result<Vec<Product>> {
        let designer_id = self.api.designer_id()?;
        let response: ListResponse<Product> = self
            .api
            .get(&format!("/products/designer/{}", segment(&designer_id)?))
            .await?;
        Ok(response.into_vec())
    }

    pub async fn get(&self, product_id: &str) -> Result<Product> {
        let response: DataResponse<Product> = self
            .api
            .get(&format!("/products/{}", segment(product_id)?))
            .await?;
        Ok(response.into_inner())
    }

    /// Create a product; the designer id is filled in from the session
    pub async fn create(&self, mut draft: ProductDraft) -> Result<Product> {
        draft.designer_id = self.api.designer_id()?;
        let response: DataResponse<Product> = self.api.post("/products", &draft).await?;
        info!("Created product {}", draft.name);
        Ok(response.into_inner())
    }

    pub async fn update(&self, product_id: &str, mut draft: ProductDraft) -> Result<Product> {
        draft.designer_id = self.api.designer_id()?;
        let response: DataResponse<Product> = self
            .api
            .put(&format!("/products/{}", segment(product_id)?), &draft)
            .await?;
        Ok(response.into_inner())
    }

    /// Flip a product between active and inactive
    pub async fn toggle_status(&self, product_id: &str) -> Result<Product> {
        let response: DataResponse<Product> = self
            .api
            .send(
                &format!("/products/{}/toggle-status", segment(product_id)?),
                RequestOptions::put(),
            )
            .await?;
        Ok(response.into_inner())
    }

    pub async fn delete(&self, product_id: &str) -> Result<Value> {
        self.api
            .delete(&format!("/products/{}", segment(product_id)?))
            .await
    }

    /// Replace the whole variant matrix of a product
    pub async fn replace_variants(&self, product_id: &str, variants: &[Variant]) -> Result<Product> {
        let response: DataResponse<Product> = self
            .api
            .put(
                &format!("/products/{}/variants", segment(product_id)?),
                &VariantsBody { variants },
            )
            .await?;
        Ok(response.into_inner())
    }

    /// Upload a spreadsheet and ask the backend to import it
    pub async fn bulk_import(
        &self,
        uploader: &MediaUploader,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<BulkImportReport> {
        let request = self.upload_sheet(uploader, file_name, bytes).await?;
        let response: DataResponse<BulkImportReport> =
            self.api.post("/products/bulk-upload", &request).await?;
        Ok(response.into_inner())
    }

    /// Bulk edit import.
    ///
    /// The backend serves this endpoint without the bearer header; it is sent
    /// unauthenticated until the backend confirms otherwise.
    pub async fn bulk_edit(
        &self,
        uploader: &MediaUploader,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<BulkImportReport> {
        let request = self.upload_sheet(uploader, file_name, bytes).await?;
        let response: DataResponse<BulkImportReport> = self
            .api
            .send_unauthenticated("/products/bulk-edit", RequestOptions::post().json(&request)?)
            .await?;
        Ok(response.into_inner())
    }

    async fn upload_sheet(
        &self,
        uploader: &MediaUploader,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<BulkImportRequest> {
        let designer_id = self.api.designer_id()?;
        let url = uploader
            .upload(&designer_id, ObjectKind::Spreadsheet, file_name, bytes)
            .await?;
        Ok(BulkImportRequest {
            designer_id,
            file_url: url.to_string(),
        })
    }
}
