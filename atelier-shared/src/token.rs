//! Bearer token inspection
//!
//! Expiry is read straight from the token payload, without contacting the
//! backend and without verifying the signature. Anything that cannot be
//! decoded is treated as expired.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried in a token payload
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp, seconds)
    pub exp: Option<i64>,
    /// Every claim, `exp` included
    pub claims: Map<String, Value>,
}

impl TokenClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Subject claim, usually the user id
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }
}

/// Remove a leading `Bearer ` if present
pub fn strip_bearer(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token).trim()
}

/// Value for the `Authorization` header, prefixed exactly once
pub fn bearer_header(token: &str) -> String {
    format!("{BEARER_PREFIX}{}", strip_bearer(token))
}

/// Decode the payload segment of a three-segment token
pub fn decode(token: &str) -> Option<TokenClaims> {
    let token = strip_bearer(token);
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims = match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => claims,
        _ => return None,
    };
    let exp = claims.get("exp").and_then(numeric_seconds);

    Some(TokenClaims { exp, claims })
}

fn numeric_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

/// Expiry time embedded in the token
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode(token).and_then(|claims| claims.expires_at())
}

/// Whether the token is absent, undecodable, has no expiry or has expired
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// [`is_expired`] against an explicit clock, in seconds
pub fn is_expired_at(token: Option<&str>, now: i64) -> bool {
    let Some(token) = token else {
        return true;
    };
    match decode(token).and_then(|claims| claims.exp) {
        Some(exp) => exp < now,
        None => true,
    }
}
