//! Order tracking and shipping

use super::segment;
use crate::dispatcher::ApiClient;
use atelier_shared::{
    AtelierError, DataResponse, ListResponse, Order, OrderStatus, OrderStatusUpdate, Result,
    Shipment, ShipmentRequest,
};
use std::sync::Arc;
use tracing::info;

pub struct OrdersApi {
    api: Arc<ApiClient>,
}

impl OrdersApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Order>> {
        let designer_id = self.api.designer_id()?;
        let response: ListResponse<Order> = self
            .api
            .get(&format!("/order/designer/{}", segment(&designer_id)?))
            .await?;
        Ok(response.into_vec())
    }

    pub async fn get(&self, order_id: &str) -> Result<Order> {
        let response: DataResponse<Order> = self
            .api
            .get(&format!("/order/{}", segment(order_id)?))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        if status == OrderStatus::Unknown {
            return Err(AtelierError::InvalidOperation(
                "cannot set an order to an unknown status".to_string(),
            ));
        }
        let response: DataResponse<Order> = self
            .api
            .patch(
                &format!("/order/{}/status", segment(order_id)?),
                &OrderStatusUpdate { status },
            )
            .await?;
        Ok(response.into_inner())
    }

    /// Book a shipment with the shipping provider
    pub async fn ship(
        &self,
        order_id: &str,
        carrier: Option<String>,
        weight_kg: f64,
    ) -> Result<Shipment> {
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return Err(AtelierError::InvalidOperation(format!(
                "invalid parcel weight: {weight_kg}"
            )));
        }
        let request = ShipmentRequest {
            order_id: segment(order_id)?.to_string(),
            designer_id: self.api.designer_id()?,
            carrier,
            weight_kg,
        };
        let response: DataResponse<Shipment> = self
            .api
            .post("/shipping/create-shipment", &request)
            .await?;
        let shipment = response.into_inner();
        info!(
            "Order {} shipped with tracking number {}",
            order_id, shipment.tracking_number
        );
        Ok(shipment)
    }
}
