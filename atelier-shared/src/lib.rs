//! Shared types and utilities for the Atelier designer dashboard

pub mod config;
pub mod credentials;
pub mod error;
pub mod token;
pub mod types;

pub use config::{
    ApiConfig, AtelierConfig, CredentialBackend, CredentialsConfig, LoggingConfig, StorageConfig,
    API_URL_ENV,
};
pub use credentials::{
    CookieAttributes, CredentialBundle, CredentialField, CredentialStore, FileCredentialStore,
    KeyringCredentialStore, MemoryCredentialStore, SameSite, StoredCredential,
};
pub use error::{AtelierError, Result};
pub use token::TokenClaims;
pub use types::*;
