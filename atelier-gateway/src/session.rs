//! Designer login session

use crate::dispatcher::{ApiClient, RequestOptions, SessionEvent};
use atelier_shared::{
    AtelierError, CredentialBundle, CredentialField, LoginData, LoginRequest, LoginResponse,
    Result,
};
use std::sync::Arc;
use tracing::info;

/// Login, logout and access to the stored session identifiers
#[derive(Clone)]
pub struct Session {
    api: Arc<ApiClient>,
}

impl Session {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Authenticate with email/password and persist the returned credentials
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AtelierError::Auth(
                "Email and password are required".to_string(),
            ));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .api
            .send_unauthenticated("/user/login", RequestOptions::post().json(&request)?)
            .await?;

        if !response.success {
            return Err(AtelierError::Auth(
                response.message.unwrap_or_else(|| "Login failed".to_string()),
            ));
        }
        let data = response.data.ok_or_else(|| {
            AtelierError::Auth("Login response did not include session data".to_string())
        })?;

        let store = self.api.store();
        store.clear_all();
        store.set(CredentialField::AccessToken, &data.access_token);
        if let Some(refresh_token) = &data.refresh_token {
            store.set(CredentialField::RefreshToken, refresh_token);
        }
        store.set(CredentialField::UserId, &data.user_id);
        if let Some(designer_id) = &data.designer_id {
            store.set(CredentialField::DesignerId, designer_id);
        }

        info!("Logged in as user {}", data.user_id);
        self.api.notify(SessionEvent::LoggedIn {
            user_id: data.user_id.clone(),
        });

        Ok(data)
    }

    /// Forget every stored credential
    pub fn logout(&self) {
        self.api.store().clear_all();
        info!("Logged out");
        self.api.notify(SessionEvent::LoggedOut);
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.store().is_authenticated()
    }

    pub fn designer_id(&self) -> Result<String> {
        self.api.designer_id()
    }

    pub fn user_id(&self) -> Result<String> {
        self.api.store().require(CredentialField::UserId)
    }

    pub fn credentials(&self) -> CredentialBundle {
        self.api.store().bundle()
    }
}
