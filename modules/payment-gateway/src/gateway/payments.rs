use serde_json::Value as JsonValue;

use super::{path_id, to_body, PaymentGateway};
use crate::config::OperationCategory;
use crate::error::GatewayError;
use crate::models::{ListPaymentsQuery, PaymentList, PaymentRequest, PaymentResponse};
use crate::transport::WireCall;
use crate::translate::{currency_to_wire, non_empty, payment_from_wire, payment_to_wire};
use crate::wire::{WirePaymentList, WirePaymentResponse};

impl PaymentGateway {
    /// Create a payment at the processor
    pub async fn create_payment(&self, req: &PaymentRequest) -> Result<PaymentResponse, GatewayError> {
        let wire = payment_to_wire(req, &self.outbound)?;

        tracing::info!(
            user_id = %req.user_id,
            order_id = %req.order_id,
            amount = req.amount,
            currency = %wire.currency,
            payment_method = %wire.payment_method,
            "Creating payment"
        );

        let call = WireCall::post("/payments", to_body(&wire)?);
        let resp: WirePaymentResponse = self.execute_json(OperationCategory::Mutation, call).await?;
        let payment = payment_from_wire(resp, Some(&req.user_id), Some(&req.order_id));

        tracing::info!(
            payment_id = %payment.payment_id,
            status = %payment.status.as_str(),
            "Payment created"
        );
        Ok(payment)
    }

    /// Look a payment up by processor id; correlation ids come back from metadata
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentResponse, GatewayError> {
        let payment_id = path_id("payment_id", payment_id)?;
        let call = WireCall::get(format!("/payments/{}", payment_id));
        let resp: WirePaymentResponse = self.execute_json(OperationCategory::Read, call).await?;
        Ok(payment_from_wire(resp, None, None))
    }

    /// Confirm a payment. The confirmation payload is forwarded as-is.
    pub async fn confirm_payment(
        &self,
        payment_id: &str,
        confirmation: JsonValue,
    ) -> Result<PaymentResponse, GatewayError> {
        let payment_id = path_id("payment_id", payment_id)?;
        if !confirmation.is_object() {
            return Err(GatewayError::validation("body", "confirmation payload must be a JSON object"));
        }

        tracing::info!(payment_id = %payment_id, "Confirming payment");

        let call = WireCall::post(format!("/payments/{}/confirm", payment_id), confirmation);
        let resp: WirePaymentResponse = self.execute_json(OperationCategory::Mutation, call).await?;
        let payment = payment_from_wire(resp, None, None);

        tracing::info!(
            payment_id = %payment.payment_id,
            status = %payment.status.as_str(),
            "Payment confirmed"
        );
        Ok(payment)
    }

    pub async fn list_payments(&self, query: &ListPaymentsQuery) -> Result<PaymentList, GatewayError> {
        let mut call = WireCall::get("/payments")
            .with_query("limit", query.effective_limit().to_string())
            .with_query("offset", query.offset.unwrap_or(0).to_string());

        let filters = [
            ("status", query.status.as_deref().and_then(non_empty)),
            (
                "currency",
                query
                    .currency
                    .as_deref()
                    .and_then(non_empty)
                    .map(|c| currency_to_wire(&c)),
            ),
            ("payment_method", query.payment_method.as_deref().and_then(non_empty)),
            ("customer_id", query.customer_id.as_deref().and_then(non_empty)),
        ];
        for (key, value) in filters {
            if let Some(value) = value {
                call = call.with_query(key, value);
            }
        }

        let list: WirePaymentList = self.execute_json(OperationCategory::Mutation, call).await?;
        let data: Vec<PaymentResponse> = list
            .into_items()
            .into_iter()
            .map(|wire| payment_from_wire(wire, None, None))
            .collect();

        tracing::debug!(count = data.len(), "Listed payments");
        Ok(PaymentList {
            count: data.len(),
            data,
        })
    }
}
