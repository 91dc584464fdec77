//! Configuration management for the Atelier dashboard client

use crate::credentials::{CredentialStore, FileCredentialStore, KeyringCredentialStore};
use crate::{AtelierError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the backend origin
pub const API_URL_ENV: &str = "ATELIER_API_URL";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    /// Backend REST API
    pub api: ApiConfig,

    /// Object storage used for images, videos and spreadsheets
    pub storage: StorageConfig,

    /// Credential persistence
    pub credentials: CredentialsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin every request path is appended to
    pub base_url: String,

    /// Request timeout in seconds, 0 disables it
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where objects are uploaded to
    pub upload_url: String,

    /// Public prefix objects are served from
    pub public_url: String,

    /// Top-level folder for this dashboard's objects
    pub namespace: String,

    /// Bearer key for the upload endpoint
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Where the session values are kept
    pub backend: CredentialBackend,

    /// Keyring service name
    pub service_name: String,

    /// Session file for the `file` backend
    pub file_path: Option<PathBuf>,

    /// Stored values are flagged secure (HTTPS only)
    pub production: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    Keyring,
    File,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_url: "http://localhost:9000/upload".to_string(),
            public_url: "http://localhost:9000/files".to_string(),
            namespace: "designer-dashboard".to_string(),
            api_key: None,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::Keyring,
            service_name: "atelier".to_string(),
            file_path: None,
            production: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl CredentialsConfig {
    /// Open the configured credential store
    pub fn open_store(&self) -> Result<Arc<dyn CredentialStore>> {
        match self.backend {
            CredentialBackend::Keyring => Ok(Arc::new(KeyringCredentialStore::new(
                self.service_name.clone(),
                self.production,
            )?)),
            CredentialBackend::File => {
                let path = match &self.file_path {
                    Some(path) => path.clone(),
                    None => ProjectDirs::from("com", "atelier", "atelier")
                        .map(|dirs| dirs.data_dir().join("credentials.json"))
                        .ok_or_else(|| {
                            AtelierError::Config(
                                "No home directory for the credentials file".to_string(),
                            )
                        })?,
                };
                Ok(Arc::new(FileCredentialStore::new(path, self.production)))
            }
        }
    }
}

impl AtelierConfig {
    /// Load configuration from file or fall back to defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Default location of the config file for this user
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "atelier", "atelier")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AtelierError::Config(format!("api.base_url: {e}")))?;
        url::Url::parse(&self.storage.upload_url)
            .map_err(|e| AtelierError::Config(format!("storage.upload_url: {e}")))?;
        url::Url::parse(&self.storage.public_url)
            .map_err(|e| AtelierError::Config(format!("storage.public_url: {e}")))?;
        if self.credentials.service_name.is_empty() {
            return Err(AtelierError::Config(
                "credentials.service_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
