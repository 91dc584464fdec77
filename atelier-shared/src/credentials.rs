//! Credential storage for the designer session
//!
//! The dashboard keeps four values between runs: the access token, the
//! refresh token, the user id and the designer id. Each is stored with
//! cookie-like attributes so the lifetime policy is the same regardless of
//! the backing store.

use crate::{AtelierError, Result};
use aes_gcm::{AeadInPlace, Aes256Gcm, KeyInit, Nonce};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use keyring::Entry;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// One of the persisted session values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialField {
    AccessToken,
    RefreshToken,
    UserId,
    DesignerId,
}

impl CredentialField {
    pub const ALL: [CredentialField; 4] = [
        CredentialField::AccessToken,
        CredentialField::RefreshToken,
        CredentialField::UserId,
        CredentialField::DesignerId,
    ];

    /// Name the value is stored under
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::UserId => "userId",
            Self::DesignerId => "designerId",
        }
    }

    /// Human readable name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::AccessToken => "access token",
            Self::RefreshToken => "refresh token",
            Self::UserId => "user ID",
            Self::DesignerId => "designer ID",
        }
    }

    /// How long a stored value stays valid
    pub fn lifetime(&self) -> Duration {
        match self {
            Self::RefreshToken => Duration::days(30),
            _ => Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Attributes a value is persisted with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub expires_in: Duration,
    /// Only sent over HTTPS; enabled in production
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl CookieAttributes {
    pub fn for_field(field: CredentialField, production: bool) -> Self {
        Self {
            expires_in: field.lifetime(),
            secure: production,
            same_site: SameSite::Strict,
            path: "/".to_string(),
        }
    }
}

/// A persisted value together with its attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl StoredCredential {
    pub fn new(value: &str, attributes: &CookieAttributes, now: DateTime<Utc>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: now + attributes.expires_in,
            secure: attributes.secure,
            same_site: attributes.same_site,
            path: attributes.path.clone(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Snapshot of every session value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    pub designer_id: Option<String>,
}

/// Durable key-value storage of the session values.
///
/// Storage failures are a platform concern: implementations log them and
/// behave as if the value were absent.
pub trait CredentialStore: Send + Sync {
    /// Persist `value` for `field`. Empty values are ignored.
    fn set(&self, field: CredentialField, value: &str);

    fn get(&self, field: CredentialField) -> Option<String>;

    fn remove(&self, field: CredentialField);

    fn clear_all(&self) {
        for field in CredentialField::ALL {
            self.remove(field);
        }
    }

    /// Access token and user id are both present. Token expiry is not checked.
    fn is_authenticated(&self) -> bool {
        self.get(CredentialField::AccessToken).is_some()
            && self.get(CredentialField::UserId).is_some()
    }

    fn require(&self, field: CredentialField) -> Result<String> {
        self.get(field)
            .ok_or(AtelierError::MissingCredential(field))
    }

    fn bundle(&self) -> CredentialBundle {
        CredentialBundle {
            access_token: self.get(CredentialField::AccessToken),
            refresh_token: self.get(CredentialField::RefreshToken),
            user_id: self.get(CredentialField::UserId),
            designer_id: self.get(CredentialField::DesignerId),
        }
    }
}

/// Process-local store, used by tests and one-shot sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<CredentialField, StoredCredential>>,
    production: bool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn production() -> Self {
        Self {
            entries: Mutex::default(),
            production: true,
        }
    }

    /// Raw entry including attributes, expired or not
    pub fn entry(&self, field: CredentialField) -> Option<StoredCredential> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field)
            .cloned()
    }

    /// Insert a pre-built entry, bypassing the lifetime policy
    pub fn insert_entry(&self, field: CredentialField, entry: StoredCredential) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field, entry);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, field: CredentialField, value: &str) {
        if value.is_empty() {
            return;
        }
        let attributes = CookieAttributes::for_field(field, self.production);
        let entry = StoredCredential::new(value, &attributes, Utc::now());
        self.insert_entry(field, entry);
    }

    fn get(&self, field: CredentialField) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&field)?.is_expired_at(Utc::now()) {
            entries.remove(&field);
            return None;
        }
        entries.get(&field).map(|entry| entry.value.clone())
    }

    fn remove(&self, field: CredentialField) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&field);
    }

    fn clear_all(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Store backed by the OS keyring, one encrypted entry per field
pub struct KeyringCredentialStore {
    /// Service name for keyring entries
    service_name: String,
    /// Encryption key for the entry payloads
    encryption_key: [u8; 32],
    production: bool,
}

impl KeyringCredentialStore {
    pub fn new(service_name: String, production: bool) -> Result<Self> {
        let encryption_key = Self::get_or_create_encryption_key(&service_name)?;

        Ok(Self {
            service_name,
            encryption_key,
            production,
        })
    }

    fn entry(&self, field: CredentialField) -> Result<Entry> {
        let key = format!("atelier:{}", field.cookie_name());
        Entry::new(&self.service_name, &key)
            .map_err(|e| AtelierError::Storage(format!("Failed to create keyring entry: {e}")))
    }

    fn store(&self, field: CredentialField, credential: &StoredCredential) -> Result<()> {
        let serialized = serde_json::to_vec(credential)?;
        let sealed = seal(&self.encryption_key, &serialized)?;
        let encoded = general_purpose::STANDARD.encode(sealed);

        self.entry(field)?
            .set_password(&encoded)
            .map_err(|e| AtelierError::Storage(format!("Failed to store {}: {e}", field.label())))
    }

    fn load(&self, field: CredentialField) -> Result<Option<StoredCredential>> {
        let encoded = match self.entry(field)?.get_password() {
            Ok(encoded) => encoded,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => {
                return Err(AtelierError::Storage(format!(
                    "Failed to read {}: {e}",
                    field.label()
                )))
            }
        };

        let sealed = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AtelierError::Storage(format!("Failed to decode {}: {e}", field.label())))?;
        let plain = open(&self.encryption_key, &sealed)?;

        Ok(Some(serde_json::from_slice(&plain)?))
    }

    fn get_or_create_encryption_key(service_name: &str) -> Result<[u8; 32]> {
        let key_entry = Entry::new(service_name, "encryption-key")
            .map_err(|e| AtelierError::Storage(format!("Failed to create key entry: {e}")))?;

        if let Some(key) = existing_key(key_entry.get_password())? {
            return Ok(key);
        }

        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);

        let encoded_key = general_purpose::STANDARD.encode(key);
        key_entry
            .set_password(&encoded_key)
            .map_err(|e| AtelierError::Storage(format!("Failed to store encryption key: {e}")))?;

        Ok(key)
    }
}

/// Decode a stored encryption key. `None` only when no key was ever stored;
/// every other keyring failure is returned as an error.
fn existing_key(lookup: keyring::Result<String>) -> Result<Option<[u8; 32]>> {
    let encoded_key = match lookup {
        Ok(encoded_key) => encoded_key,
        Err(keyring::Error::NoEntry) => return Ok(None),
        Err(e) => {
            return Err(AtelierError::Storage(format!(
                "Failed to read encryption key: {e}"
            )))
        }
    };

    let key_bytes = general_purpose::STANDARD
        .decode(encoded_key)
        .map_err(|e| AtelierError::Storage(format!("Failed to decode encryption key: {e}")))?;

    <[u8; 32]>::try_from(key_bytes)
        .map(Some)
        .map_err(|_| AtelierError::Storage("Invalid encryption key length".to_string()))
}

impl CredentialStore for KeyringCredentialStore {
    fn set(&self, field: CredentialField, value: &str) {
        if value.is_empty() {
            return;
        }
        let attributes = CookieAttributes::for_field(field, self.production);
        let credential = StoredCredential::new(value, &attributes, Utc::now());
        if let Err(e) = self.store(field, &credential) {
            warn!("Could not persist {}: {}", field.label(), e);
        }
    }

    fn get(&self, field: CredentialField) -> Option<String> {
        match self.load(field) {
            Ok(Some(credential)) if credential.is_expired_at(Utc::now()) => {
                debug!("Stored {} has expired", field.label());
                self.remove(field);
                None
            }
            Ok(Some(credential)) => Some(credential.value),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read {}: {}", field.label(), e);
                None
            }
        }
    }

    fn remove(&self, field: CredentialField) {
        let result = self.entry(field).and_then(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AtelierError::Storage(e.to_string())),
        });
        if let Err(e) = result {
            warn!("Could not remove {}: {}", field.label(), e);
        }
    }
}

/// Store backed by a JSON file, for hosts without a usable keyring
pub struct FileCredentialStore {
    path: PathBuf,
    production: bool,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, production: bool) -> Self {
        Self {
            path: path.into(),
            production,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HashMap<CredentialField, StoredCredential>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &HashMap<CredentialField, StoredCredential>) -> Result<()> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Read-modify-write under the store lock
    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<CredentialField, StoredCredential>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read()?;
        change(&mut entries);
        self.write(&entries)
    }
}

impl CredentialStore for FileCredentialStore {
    fn set(&self, field: CredentialField, value: &str) {
        if value.is_empty() {
            return;
        }
        let attributes = CookieAttributes::for_field(field, self.production);
        let credential = StoredCredential::new(value, &attributes, Utc::now());
        if let Err(e) = self.update(|entries| {
            entries.insert(field, credential);
        }) {
            warn!("Could not persist {}: {}", field.label(), e);
        }
    }

    fn get(&self, field: CredentialField) -> Option<String> {
        let entries = {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.read()
        };
        match entries {
            Ok(mut entries) => match entries.remove(&field) {
                Some(credential) if credential.is_expired_at(Utc::now()) => {
                    debug!("Stored {} has expired", field.label());
                    self.remove(field);
                    None
                }
                Some(credential) => Some(credential.value),
                None => None,
            },
            Err(e) => {
                warn!("Could not read {}: {}", field.label(), e);
                None
            }
        }
    }

    fn remove(&self, field: CredentialField) {
        if let Err(e) = self.update(|entries| {
            entries.remove(&field);
        }) {
            warn!("Could not remove {}: {}", field.label(), e);
        }
    }

    fn clear_all(&self) {
        if let Err(e) = self.update(HashMap::clear) {
            warn!("Could not clear credentials: {}", e);
        }
    }
}

/// Encrypt with AES-256-GCM, prepending the random nonce
fn seal(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(&(*key).into());

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut buffer = data.to_vec();
    cipher
        .encrypt_in_place(nonce, b"", &mut buffer)
        .map_err(|e| AtelierError::Storage(format!("Encryption failed: {e}")))?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&buffer);
    Ok(result)
}

fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < 12 {
        return Err(AtelierError::Storage("Invalid encrypted data".to_string()));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(&(*key).into());

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place(nonce, b"", &mut buffer)
        .map_err(|e| AtelierError::Storage(format!("Decryption failed: {e}")))?;

    Ok(buffer)
}
