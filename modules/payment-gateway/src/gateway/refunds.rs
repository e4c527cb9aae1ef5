use super::{path_id, to_body, PaymentGateway};
use crate::config::OperationCategory;
use crate::error::GatewayError;
use crate::models::{RefundRequest, RefundResponse};
use crate::transport::WireCall;
use crate::translate::{refund_from_wire, refund_to_wire};
use crate::wire::WireRefundResponse;

impl PaymentGateway {
    /// Refund a payment, fully when no positive amount is given
    pub async fn create_refund(&self, req: &RefundRequest) -> Result<RefundResponse, GatewayError> {
        let wire = refund_to_wire(req)?;

        tracing::info!(
            payment_id = %wire.payment_id,
            amount = ?wire.amount,
            full_refund = wire.amount.is_none(),
            "Creating refund"
        );

        let call = WireCall::post("/refunds", to_body(&wire)?);
        let resp: WireRefundResponse = self.execute_json(OperationCategory::Mutation, call).await?;
        let refund = refund_from_wire(resp);

        tracing::info!(
            refund_id = %refund.refund_id,
            payment_id = %refund.payment_id,
            amount = refund.amount,
            "Refund created"
        );
        Ok(refund)
    }

    pub async fn get_refund(&self, refund_id: &str) -> Result<RefundResponse, GatewayError> {
        let refund_id = path_id("refund_id", refund_id)?;
        let call = WireCall::get(format!("/refunds/{}", refund_id));
        let resp: WireRefundResponse = self.execute_json(OperationCategory::Read, call).await?;
        Ok(refund_from_wire(resp))
    }
}
