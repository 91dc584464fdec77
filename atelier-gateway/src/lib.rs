//! Atelier gateway - authenticated access to the designer dashboard backend

pub mod api;
pub mod dispatcher;
pub mod export;
pub mod listing;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod variants;

pub use api::{OrdersApi, ProductsApi, ProfileApi, ReturnsApi, VideoUpload, VideosApi};
pub use dispatcher::{ApiClient, RequestOptions, SessionEvent};
pub use export::{orders_to_csv, products_to_csv, write_orders_csv, write_products_csv};
pub use listing::{filter_items, paginate, ListingQuery, Page, Searchable};
pub use refresh::{
    HttpTokenRefresher, RefreshCoordinator, RefreshFailure, RefreshOutcome, RefreshedTokens,
    TokenRefresher,
};
pub use session::Session;
pub use storage::{HttpObjectStorage, MediaUploader, ObjectKind, ObjectStorage};
pub use variants::VariantMatrix;

use atelier_shared::{AtelierConfig, CredentialStore, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Entry point that wires the API client, session and uploads together
pub struct Dashboard {
    api: Arc<ApiClient>,
    session: Session,
    uploader: MediaUploader,
}

impl Dashboard {
    pub fn new(config: &AtelierConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api, store)?);
        let storage = Arc::new(HttpObjectStorage::new(api.http().clone(), &config.storage));
        let uploader = MediaUploader::new(storage, config.storage.namespace.clone());
        Ok(Self::from_parts(api, uploader))
    }

    /// Assemble a dashboard around an existing client and uploader
    pub fn from_parts(api: Arc<ApiClient>, uploader: MediaUploader) -> Self {
        tracing::debug!("Dashboard ready for {}", api.base_url());
        Self {
            session: Session::new(api.clone()),
            api,
            uploader,
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn uploader(&self) -> &MediaUploader {
        &self.uploader
    }

    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.api.clone())
    }

    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.api.clone())
    }

    pub fn returns(&self) -> ReturnsApi {
        ReturnsApi::new(self.api.clone())
    }

    pub fn videos(&self) -> VideosApi {
        VideosApi::new(self.api.clone())
    }

    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.api.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.api.subscribe()
    }
}
