use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};

use crate::error::GatewayError;
use crate::gateway::PaymentGateway;
use crate::models::{
    AnalyticsQuery, ConnectorAnalyticsQuery, CustomerRequest, CustomerResponse, HealthReport, ListPaymentsQuery,
    PaymentList, PaymentMethodsQuery, PaymentRequest, PaymentResponse, RefundRequest,
    RefundResponse,
};
use crate::webhook::{WebhookRouter, SIGNATURE_HEADER};

/// Shared state for every route
#[derive(Clone)]
pub struct AppState {
    pub gateway: PaymentGateway,
    pub webhooks: WebhookRouter,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(liveness))
        // Payments
        .route("/api/gateway/payments", post(create_payment).get(list_payments))
        .route("/api/gateway/payments/{payment_id}", get(get_payment))
        .route("/api/gateway/payments/{payment_id}/confirm", post(confirm_payment))
        // Refunds
        .route("/api/gateway/refunds", post(create_refund))
        .route("/api/gateway/refunds/{refund_id}", get(get_refund))
        // Customers
        .route("/api/gateway/customers", post(create_customer))
        .route("/api/gateway/customers/{customer_id}", get(get_customer))
        .route(
            "/api/gateway/customers/{customer_id}/payment-methods",
            get(payment_methods),
        )
        // Account
        .route("/api/gateway/analytics/payments", get(payment_analytics))
        .route("/api/gateway/analytics/cost-observability", get(cost_analytics))
        .route("/api/gateway/analytics/revenue-recovery", get(revenue_recovery_analytics))
        .route("/api/gateway/analytics/fraud-check", get(fraud_analytics))
        .route("/api/gateway/analytics/connectors", get(connector_analytics))
        .route("/api/gateway/system/connectors", get(connectors))
        .route("/api/gateway/system/health", get(processor_health))
        // Webhooks
        .route("/api/gateway/webhooks/processor", post(receive_processor_webhook))
        .with_state(state)
}

/// Malformed request bodies are validation errors on `body`
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| GatewayError::validation("body", rejection.body_text()))
}

async fn liveness() -> Json<JsonValue> {
    Json(json!({
        "status": "healthy",
        "module": "payment-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /api/gateway/payments
async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), GatewayError> {
    let req = json_body(payload)?;
    let payment = state.gateway.create_payment(&req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/gateway/payments
async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PaymentList>, GatewayError> {
    Ok(Json(state.gateway.list_payments(&query).await?))
}

/// GET /api/gateway/payments/{payment_id}
async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentResponse>, GatewayError> {
    Ok(Json(state.gateway.get_payment(&payment_id).await?))
}

/// POST /api/gateway/payments/{payment_id}/confirm
async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<PaymentResponse>, GatewayError> {
    let confirmation = json_body(payload)?;
    Ok(Json(
        state
            .gateway
            .confirm_payment(&payment_id, confirmation)
            .await?,
    ))
}

/// POST /api/gateway/refunds
async fn create_refund(
    State(state): State<AppState>,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RefundResponse>), GatewayError> {
    let req = json_body(payload)?;
    let refund = state.gateway.create_refund(&req).await?;
    Ok((StatusCode::CREATED, Json(refund)))
}

/// GET /api/gateway/refunds/{refund_id}
async fn get_refund(
    State(state): State<AppState>,
    Path(refund_id): Path<String>,
) -> Result<Json<RefundResponse>, GatewayError> {
    Ok(Json(state.gateway.get_refund(&refund_id).await?))
}

/// POST /api/gateway/customers
async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerResponse>), GatewayError> {
    let req = json_body(payload)?;
    let customer = state.gateway.create_customer(&req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/gateway/customers/{customer_id}
async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, GatewayError> {
    Ok(Json(state.gateway.get_customer(&customer_id).await?))
}

/// GET /api/gateway/customers/{customer_id}/payment-methods
async fn payment_methods(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<PaymentMethodsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(
        state.gateway.payment_methods(&customer_id, &query).await?,
    ))
}

/// GET /api/gateway/analytics/payments
async fn payment_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.payment_analytics(&query).await?))
}

/// GET /api/gateway/analytics/cost-observability
async fn cost_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.cost_analytics(&query).await?))
}

/// GET /api/gateway/analytics/revenue-recovery
async fn revenue_recovery_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.revenue_recovery_analytics(&query).await?))
}

/// GET /api/gateway/analytics/fraud-check
async fn fraud_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.fraud_analytics(&query).await?))
}

/// GET /api/gateway/analytics/connectors
async fn connector_analytics(
    State(state): State<AppState>,
    Query(query): Query<ConnectorAnalyticsQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.connector_analytics(&query).await?))
}

/// GET /api/gateway/system/connectors
async fn connectors(State(state): State<AppState>) -> Result<Json<JsonValue>, GatewayError> {
    Ok(Json(state.gateway.connectors().await?))
}

/// GET /api/gateway/system/health
async fn processor_health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.gateway.health_check().await;
    let status = if report.processor_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// POST /api/gateway/webhooks/processor
///
/// Acknowledges with `{"status":"received"}` once dispatch was attempted.
/// Signature and envelope problems are rejected before any handler runs.
async fn receive_processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<JsonValue>, GatewayError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let receipt = state.webhooks.handle(signature, &body).await?;

    tracing::debug!(
        event_id = %receipt.event_id,
        outcome = ?receipt.outcome,
        "Webhook acknowledged"
    );
    Ok(Json(json!({ "status": "received" })))
}
