//! Shared types for the designer dashboard backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<LoginData>,
}

/// Session data returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub designer_id: Option<String>,
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub designer: Value,
    #[serde(rename = "is_approved", default)]
    pub is_approved: bool,
}

/// List payloads arrive either bare or wrapped in `{ "data": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Single-object payloads, bare or wrapped in `{ "data": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DataResponse<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> DataResponse<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Product information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    pub fn status(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "inactive"
        }
    }

    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }
}

fn default_true() -> bool {
    true
}

/// One size/colour combination of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub sku: String,
    pub size: String,
    pub color: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
}

/// Product create/update body
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub designer_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub price: f64,
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
}

/// Bulk spreadsheet import request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportRequest {
    pub designer_id: String,
    pub file_url: String,
}

/// Result of a bulk spreadsheet import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkImportReport {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
            Self::Unknown => "unknown",
        }
    }
}

/// Order information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Order line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub quantity: u32,
    pub price: f64,
}

/// Postal address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// Order status change body
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Shipment creation request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    pub order_id: String,
    pub designer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    pub weight_kg: f64,
}

/// Shipment created by the shipping provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub tracking_number: String,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub label_url: Option<String>,
}

/// Return request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        }
    }
}

/// Customer return request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    #[serde(alias = "_id")]
    pub id: String,
    pub order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: ReturnStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Designer decision on a return request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnDecisionKind {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnDecision {
    pub decision: ReturnDecisionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Product-tagged content video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVideo {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for publishing a video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContentVideo {
    pub designer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub video_url: String,
    pub product_ids: Vec<String>,
}

/// Designer profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub brand_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, rename = "is_approved")]
    pub is_approved: bool,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_shapes() {
        let bare: ListResponse<Variant> = serde_json::from_value(json!([
            { "sku": "A-S-RED", "size": "S", "color": "Red", "price": 10.0 }
        ]))
        .unwrap();
        assert_eq!(bare.into_vec()[0].stock, 0);

        let wrapped: ListResponse<Variant> = serde_json::from_value(json!({
            "success": true,
            "data": [{ "sku": "A-M-RED", "size": "M", "color": "Red", "price": 10.0, "stock": 3 }]
        }))
        .unwrap();
        assert_eq!(wrapped.into_vec()[0].stock, 3);
    }

    #[test]
    fn test_product_accepts_mongo_id_and_defaults() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Linen shirt"
        }))
        .unwrap();

        assert_eq!(product.id, "p1");
        assert!(product.is_active);
        assert_eq!(product.status(), "active");
        assert_eq!(product.total_stock(), 0);
    }

    #[test]
    fn test_unknown_order_status() {
        let order: Order = serde_json::from_value(json!({
            "id": "o1",
            "status": "on-hold"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
    }

    #[test]
    fn test_login_envelope() {
        let response: LoginResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "accessToken": "a",
                "refreshToken": "r",
                "userId": "u1",
                "designerId": "d1",
                "user": { "email": "ana@example.com" },
                "designer": { "brandName": "Ana" },
                "is_approved": true
            }
        }))
        .unwrap();

        let data = response.data.unwrap();
        assert!(response.success);
        assert_eq!(data.designer_id.as_deref(), Some("d1"));
        assert!(data.is_approved);
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            bio: Some("Slow fashion".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({ "bio": "Slow fashion" }));
    }
}
