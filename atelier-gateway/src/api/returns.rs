//! Return request handling

use super::segment;
use crate::dispatcher::ApiClient;
use atelier_shared::{
    DataResponse, ListResponse, Result, ReturnDecision, ReturnDecisionKind, ReturnRequest,
};
use std::sync::Arc;

pub struct ReturnsApi {
    api: Arc<ApiClient>,
}

impl ReturnsApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<ReturnRequest>> {
        let designer_id = self.api.designer_id()?;
        let response: ListResponse<ReturnRequest> = self
            .api
            .get(&format!("/order/returns/designer/{}", segment(&designer_id)?))
            .await?;
        Ok(response.into_vec())
    }

    pub async fn approve(&self, return_id: &str, note: Option<String>) -> Result<ReturnRequest> {
        self.decide(return_id, ReturnDecisionKind::Approve, note)
            .await
    }

    pub async fn reject(&self, return_id: &str, note: Option<String>) -> Result<ReturnRequest> {
        self.decide(return_id, ReturnDecisionKind::Reject, note)
            .await
    }

    async fn decide(
        &self,
        return_id: &str,
        decision: ReturnDecisionKind,
        note: Option<String>,
    ) -> Result<ReturnRequest> {
        let response: DataResponse<ReturnRequest> = self
            .api
            .post(
                &format!("/order/returns/{}/decision", segment(return_id)?),
                &ReturnDecision { decision, note },
            )
            .await?;
        Ok(response.into_inner())
    }
}
