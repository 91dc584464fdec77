//! Request dispatcher - the single entry point to the backend
//!
//! Every call reads the stored access token, refreshes it through the
//! [`RefreshCoordinator`] when it is stale, attaches the bearer header and
//! normalizes error responses into [`AtelierError::Api`].

use crate::refresh::{HttpTokenRefresher, RefreshCoordinator};
use atelier_shared::{token, ApiConfig, AtelierError, CredentialField, CredentialStore, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

/// Session-level notifications for the embedding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: String },
    LoggedOut,
    /// Credentials were cleared; the user has to go back to the login screen
    LoginRequired { reason: String },
}

/// Method, body and extra headers of one request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Vec<u8>>,
    /// Applied after the defaults, so they can override `Content-Type`
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Serialize `body` as the JSON request body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Authenticated client for the dashboard backend
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Build a client, its HTTP refresher and coordinator from configuration
    pub fn new(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build().map_err(AtelierError::Network)?;

        let refresher = Arc::new(HttpTokenRefresher::new(client.clone(), &config.base_url));
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), refresher));

        Self::with_coordinator(client, &config.base_url, store, coordinator)
    }

    /// Assemble a client around an existing coordinator
    pub fn with_coordinator(
        client: Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Result<Self> {
        Url::parse(base_url)?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            coordinator,
            events,
        })
    }

    /// Underlying HTTP client, shared with object storage uploads
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Stored designer id, required by every designer-scoped endpoint
    pub fn designer_id(&self) -> Result<String> {
        self.store.require(CredentialField::DesignerId)
    }

    /// Backend origin joined with `path`
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Ok(Url::parse(&url)?)
    }

    /// Send an authenticated request and decode the JSON response.
    ///
    /// Refresh failures clear the stored credentials and publish
    /// [`SessionEvent::LoginRequired`] before being returned.
    pub async fn send<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        match self.dispatch(path, options, true).await {
            Err(e) if e.requires_login() => {
                warn!("Session expired: {}", e);
                self.store.clear_all();
                self.notify(SessionEvent::LoginRequired {
                    reason: e.to_string(),
                });
                Err(e)
            }
            result => result,
        }
    }

    /// Send a request without an `Authorization` header
    pub async fn send_unauthenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.dispatch(path, options, false).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(path, RequestOptions::get()).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(path, RequestOptions::post().json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(path, RequestOptions::put().json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(path, RequestOptions::patch().json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(path, RequestOptions::delete()).await
    }

    /// Current access token, refreshed first when it has expired
    async fn access_token(&self) -> Result<Option<String>> {
        match self.store.get(CredentialField::AccessToken) {
            Some(token) if token::is_expired(Some(&token)) => {
                debug!("Access token is stale, refreshing");
                self.coordinator.refresh().await.map(Some)
            }
            token => Ok(token),
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        authenticated: bool,
    ) -> Result<T> {
        let url = self.url_for(path)?;
        let token = if authenticated {
            self.access_token().await?
        } else {
            None
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &token {
            let value = HeaderValue::from_str(&token::bearer_header(token))
                .map_err(|e| AtelierError::Auth(format!("Invalid access token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(options.headers);

        debug!("{} {}", options.method, url);
        let mut request = self.client.request(options.method, url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes);
            debug!("Request failed with {}: {:?}", status, message);
            return Err(AtelierError::api(status.as_u16(), message));
        }

        parse_body(&bytes)
    }
}

/// Best-effort message from a JSON error body
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Decode a success body; an empty body reads as JSON `null`
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(body)?)
}
