//! Error types for the Atelier dashboard gateway

use crate::credentials::CredentialField;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtelierError>;

#[derive(Error, Debug)]
pub enum AtelierError {
    #[error("No {} found, please log in again", .0.label())]
    MissingCredential(CredentialField),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl AtelierError {
    /// Build the error for a non-2xx response, falling back to the generic
    /// status message when the body carried none.
    pub fn api(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        Self::Api { status, message }
    }

    /// Whether this failure invalidates the session and the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::RefreshFailed(_) | Self::NoRefreshToken)
    }

    /// HTTP status for backend failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_errors_require_login() {
        assert!(AtelierError::NoRefreshToken.requires_login());
        assert!(AtelierError::RefreshFailed("HTTP 401".into()).requires_login());
        assert!(!AtelierError::api(500, None).requires_login());
        assert!(!AtelierError::MissingCredential(CredentialField::DesignerId).requires_login());
    }

    #[test]
    fn test_messages_match_login_triggers() {
        assert_eq!(
            AtelierError::NoRefreshToken.to_string(),
            "No refresh token available"
        );
        assert!(AtelierError::RefreshFailed("HTTP 401".into())
            .to_string()
            .starts_with("Token refresh failed"));
    }

    #[test]
    fn test_api_error_message_fallback() {
        let err = AtelierError::api(404, None);
        assert_eq!(err.to_string(), "HTTP error! status: 404");
        assert_eq!(err.status(), Some(404));

        let err = AtelierError::api(422, Some("SKU already exists".into()));
        assert_eq!(err.to_string(), "SKU already exists");

        let err = AtelierError::api(400, Some("  ".into()));
        assert_eq!(err.to_string(), "HTTP error! status: 400");
    }
}
