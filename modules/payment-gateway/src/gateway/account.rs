use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use super::{path_id, PaymentGateway};
use crate::config::OperationCategory;
use crate::error::GatewayError;
use crate::models::{AnalyticsQuery, ConnectorAnalyticsQuery, HealthReport, PaymentMethodsQuery};
use crate::transport::WireCall;
use crate::translate::{currency_canonical, non_empty};

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_GRANULARITY: &str = "day";
const DEFAULT_ANALYTICS_WINDOW_DAYS: i64 = 7;

impl PaymentGateway {
    /// Payment methods the processor offers this customer; returned as-is
    pub async fn payment_methods(
        &self,
        customer_id: &str,
        query: &PaymentMethodsQuery,
    ) -> Result<JsonValue, GatewayError> {
        let customer_id = path_id("customer_id", customer_id)?;
        let currency = query
            .currency
            .as_deref()
            .and_then(non_empty)
            .map(|c| currency_canonical(&c))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let country = query
            .country
            .as_deref()
            .and_then(non_empty)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        let call = WireCall::get("/account/payment_methods")
            .with_query("customer_id", customer_id)
            .with_query("currency", currency)
            .with_query("country", country);
        self.execute_json(OperationCategory::Read, call).await
    }

    /// Connectors configured on the processor account; returned as-is
    pub async fn connectors(&self) -> Result<JsonValue, GatewayError> {
        self.execute_json(OperationCategory::Read, WireCall::get("/account/connectors"))
            .await
    }

    /// Payment analytics over a window that defaults to the last seven days
    pub async fn payment_analytics(&self, query: &AnalyticsQuery) -> Result<JsonValue, GatewayError> {
        let mut call = windowed("/analytics/payments", query);
        if let Some(currency) = query.currency.as_deref().and_then(non_empty) {
            call = call.with_query("currency", currency_canonical(&currency));
        }
        if let Some(method) = query.payment_method.as_deref().and_then(non_empty) {
            call = call.with_query("payment_method", method);
        }

        self.execute_json(OperationCategory::Mutation, call).await
    }

    /// Processing cost breakdown over the analytics window
    pub async fn cost_analytics(&self, query: &AnalyticsQuery) -> Result<JsonValue, GatewayError> {
        let call = windowed("/analytics/cost-observability", query);
        self.execute_json(OperationCategory::Mutation, call).await
    }

    /// Recovered revenue from retried payments over the analytics window
    pub async fn revenue_recovery_analytics(
        &self,
        query: &AnalyticsQuery,
    ) -> Result<JsonValue, GatewayError> {
        let call = windowed("/analytics/revenue-recovery", query);
        self.execute_json(OperationCategory::Mutation, call).await
    }

    /// Fraud check results over the analytics window
    pub async fn fraud_analytics(&self, query: &AnalyticsQuery) -> Result<JsonValue, GatewayError> {
        let call = windowed("/analytics/fraud-check", query);
        self.execute_json(OperationCategory::Mutation, call).await
    }

    /// Per-connector performance, for one connector or all of them
    pub async fn connector_analytics(
        &self,
        query: &ConnectorAnalyticsQuery,
    ) -> Result<JsonValue, GatewayError> {
        let mut call = WireCall::get("/analytics/connectors");
        if let Some(connector) = query.connector.as_deref().and_then(non_empty) {
            call = call.with_query("connector", connector);
        }
        self.execute_json(OperationCategory::Mutation, call).await
    }

    /// Probe processor connectivity. Never fails: an unreachable or
    /// erroring processor is reported as `degraded`.
    pub async fn health_check(&self) -> HealthReport {
        let reachable = match self
            .execute(OperationCategory::Status, WireCall::get("/health"))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Processor health check failed");
                false
            }
        };

        HealthReport {
            status: if reachable { "healthy" } else { "degraded" },
            processor_reachable: reachable,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Analytics call with `start_date`, `end_date` and `granularity` filled in.
/// The window defaults to the last seven days, ending now.
fn windowed(path: &str, query: &AnalyticsQuery) -> WireCall {
    let now = Utc::now();
    let start_date = query
        .start_date
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| {
            (now - ChronoDuration::days(DEFAULT_ANALYTICS_WINDOW_DAYS))
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        });
    let end_date = query
        .end_date
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
    let granularity = query
        .granularity
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| DEFAULT_GRANULARITY.to_string());

    WireCall::get(path)
        .with_query("start_date", start_date)
        .with_query("end_date", end_date)
        .with_query("granularity", granularity)
}
