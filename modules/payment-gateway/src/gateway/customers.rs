use super::{path_id, to_body, PaymentGateway};
use crate::config::OperationCategory;
use crate::error::GatewayError;
use crate::models::{CustomerRequest, CustomerResponse};
use crate::transport::WireCall;
use crate::translate::{customer_from_wire, customer_to_wire};
use crate::wire::WireCustomerResponse;

impl PaymentGateway {
    pub async fn create_customer(
        &self,
        req: &CustomerRequest,
    ) -> Result<CustomerResponse, GatewayError> {
        let wire = customer_to_wire(req)?;
        let call = WireCall::post("/customers", to_body(&wire)?);
        let resp: WireCustomerResponse = self.execute_json(OperationCategory::Read, call).await?;
        let customer = customer_from_wire(resp);

        tracing::info!(customer_id = %customer.customer_id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<CustomerResponse, GatewayError> {
        let customer_id = path_id("customer_id", customer_id)?;
        let call = WireCall::get(format!("/customers/{}", customer_id));
        let resp: WireCustomerResponse = self.execute_json(OperationCategory::Read, call).await?;
        Ok(customer_from_wire(resp))
    }
}
