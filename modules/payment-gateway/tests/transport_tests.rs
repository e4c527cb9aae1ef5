mod common;

use common::config_for;
use payment_gateway_rs::models::{ListPaymentsQuery, PaymentRequest};
use payment_gateway_rs::{
    ErrorKind, GatewayError, PaymentGateway, ReqwestTransport, TimeoutPolicy, Transport,
    TransportOutcome, WireCall,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_create_payment_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(header("api-key", "snd_test_key"))
        .and(header("x-merchant-id", "merchant_test"))
        .and(header_exists("x-request-id"))
        .and(body_partial_json(json!({
            "amount": 2500,
            "currency": "usd",
            "customer": {"id": "u1"},
            "metadata": {"internal_user_id": "u1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_id": "pay_http",
            "status": "requires_customer_action",
            "amount": 2500,
            "currency": "usd",
            "client_secret": "pay_http_secret",
            "next_action": {"type": "redirect_to_url", "redirect_to_url": "https://acs.example.com/3ds"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = PaymentGateway::from_config(&config_for(&server.uri())).unwrap();
    let payment = gateway
        .create_payment(&PaymentRequest {
            user_id: "u1".to_string(),
            amount: 2500,
            currency: "USD".to_string(),
            payment_method: "card".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(payment.payment_id, "pay_http");
    assert_eq!(payment.client_secret.as_deref(), Some("pay_http_secret"));
    assert_eq!(
        payment
            .next_action
            .and_then(|action| action.redirect_to_url)
            .as_deref(),
        Some("https://acs.example.com/3ds")
    );
}

#[tokio::test]
async fn test_query_parameters_reach_processor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "0"))
        .and(query_param("status", "failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = PaymentGateway::from_config(&config_for(&server.uri())).unwrap();
    let list = gateway
        .list_payments(&ListPaymentsQuery {
            status: Some("failed".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(list.count, 0);
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/pay_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "invalid_request", "code": "HE_02", "message": "Payment does not exist in our records"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments/pay_auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "invalid_request", "code": "IR_01", "message": "API key not provided or invalid API key used"}
        })))
        .mount(&server)
        .await;

    let gateway = PaymentGateway::from_config(&config_for(&server.uri())).unwrap();
    assert_eq!(
        gateway.get_payment("pay_missing").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        gateway.get_payment("pay_auth").await.unwrap_err().kind(),
        ErrorKind::AuthFailure
    );
}

#[tokio::test]
async fn test_slow_processor_hits_category_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let gateway = PaymentGateway::from_config(&config_for(&server.uri()))
        .unwrap()
        .with_timeouts(TimeoutPolicy {
            short: Duration::from_millis(200),
            ..TimeoutPolicy::default()
        });

    let report = gateway.health_check().await;
    assert_eq!(report.status, "degraded");
}

#[tokio::test]
async fn test_unreachable_processor_is_transport_failure() {
    // Nothing listens on port 1.
    let transport = ReqwestTransport::new(&config_for("http://127.0.0.1:1")).unwrap();
    let outcome = transport.send(WireCall::get("/health")).await;
    assert!(matches!(outcome, TransportOutcome::Failed { .. }));

    let gateway = PaymentGateway::from_config(&config_for("http://127.0.0.1:1")).unwrap();
    let err = gateway.connectors().await.unwrap_err();
    assert!(matches!(err, GatewayError::TransportFailure { .. }));
}

#[tokio::test]
async fn test_base_url_trailing_slash_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/connectors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"connector_name": "stripe"}])))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/", server.uri());
    let transport = ReqwestTransport::new(&config_for(&base)).unwrap();
    assert_eq!(transport.base_url(), server.uri());

    let gateway = PaymentGateway::from_config(&config_for(&base)).unwrap();
    let connectors = gateway.connectors().await.unwrap();
    assert_eq!(connectors[0]["connector_name"], "stripe");
}
