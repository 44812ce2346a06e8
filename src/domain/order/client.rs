//! Orders sub-client — validated market order submission.

use crate::client::CapitalClient;
use crate::domain::order::{OrderOptions, OrderRequest};
use crate::error::SdkError;
use crate::http::{Method, RetryPolicy};
use crate::network::POSITIONS_OTC_PATH;
use crate::shared::{Mode, OperationResult, RequestId};

pub struct Orders<'a> {
    pub(crate) client: &'a CapitalClient,
}

impl<'a> Orders<'a> {
    /// Validate and submit a market order. Invalid input never reaches the
    /// network. `data` is the broker's response (typically `{dealReference}`).
    pub async fn place(
        &self,
        direction: &str,
        epic: &str,
        size: f64,
        mode: Mode,
        options: OrderOptions,
    ) -> OperationResult<serde_json::Value> {
        let request_id = RequestId::new("ORDER");
        self.client
            .run("orders.place", Some(mode), request_id.clone(), async {
                let order = OrderRequest::new(direction, epic, size, options)?;
                self.submit_validated(&order, mode, &request_id).await
            })
            .await
    }

    /// Submit an already-validated order.
    pub async fn submit(
        &self,
        order: &OrderRequest,
        mode: Mode,
    ) -> OperationResult<serde_json::Value> {
        let request_id = RequestId::new("ORDER");
        self.client
            .run(
                "orders.place",
                Some(mode),
                request_id.clone(),
                self.submit_validated(order, mode, &request_id),
            )
            .await
    }

    async fn submit_validated(
        &self,
        order: &OrderRequest,
        mode: Mode,
        request_id: &RequestId,
    ) -> Result<serde_json::Value, SdkError> {
        tracing::info!(
            request_id = %request_id,
            mode = %mode,
            direction = %order.direction(),
            epic = order.epic(),
            size = order.size(),
            "Submitting order"
        );

        let body = serde_json::to_value(order.to_body())?;
        let resp = self
            .client
            .send_authenticated(
                mode,
                Method::Post,
                POSITIONS_OTC_PATH,
                Some(body),
                request_id,
                RetryPolicy::Standard,
                None,
            )
            .await?;

        Ok(resp.json()?)
    }
}
