//! Typed wrappers over the dashboard endpoints

pub mod orders;
pub mod products;
pub mod profile;
pub mod returns;
pub mod videos;

pub use orders::OrdersApi;
pub use products::ProductsApi;
pub use profile::ProfileApi;
pub use returns::ReturnsApi;
pub use videos::{VideoUpload, VideosApi};

use atelier_shared::{AtelierError, Result};

/// Validate an identifier before it is placed in a request path
pub(crate) fn segment(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || id.chars().any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
    {
        return Err(AtelierError::InvalidOperation(format!(
            "invalid identifier: {id:?}"
        )));
    }
    Ok(id)
}
