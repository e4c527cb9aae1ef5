#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use payment_gateway_rs::webhook::{
    Claim, IdempotencyStore, InMemoryIdempotencyStore, WebhookEvent, WebhookHandlers,
};
use payment_gateway_rs::{
    router, AckPolicy, AppState, GatewayConfig, GatewayError, HttpMethod, PaymentGateway,
    Transport, TransportOutcome, WebhookRouter, WireCall,
};
use sha2::Sha256;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Config with signed webhooks and the given acknowledgment policy
pub fn test_config(ack_policy: AckPolicy) -> GatewayConfig {
    let policy = match ack_policy {
        AckPolicy::AlwaysAcknowledge => "always",
        AckPolicy::RequireHandlerSuccess => "require_success",
    };
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PROCESSOR_API_KEY", "snd_test_key"),
        ("PROCESSOR_MERCHANT_ID", "merchant_test"),
        ("PROCESSOR_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET),
        ("PROCESSOR_WEBHOOK_URL", "https://gateway.example.com/api/gateway/webhooks/processor"),
        ("WEBHOOK_ACK_POLICY", policy),
    ]);
    GatewayConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

/// Config pointing the reqwest transport at `base_url`
pub fn config_for(base_url: &str) -> GatewayConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("PROCESSOR_API_KEY", "snd_test_key".to_string()),
        ("PROCESSOR_MERCHANT_ID", "merchant_test".to_string()),
        ("PROCESSOR_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET.to_string()),
        ("PROCESSOR_BASE_URL", base_url.to_string()),
    ]);
    GatewayConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

// ============================================================================
// Transport doubles
// ============================================================================

/// Scripted transport: answers by (method, path) and records every call
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(HttpMethod, String), VecDeque<TransportOutcome>>>,
    calls: Mutex<Vec<WireCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
        self.push(method, path, TransportOutcome::responded(status, body.to_string()));
    }

    pub fn respond_raw(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        self.push(method, path, TransportOutcome::responded(status, body));
    }

    pub fn fail(&self, method: HttpMethod, path: &str, reason: &str) {
        self.push(
            method,
            path,
            TransportOutcome::Failed {
                reason: reason.to_string(),
                timed_out: false,
            },
        );
    }

    fn push(&self, method: HttpMethod, path: &str, outcome: TransportOutcome) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    pub fn calls(&self) -> Vec<WireCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> WireCall {
        self.calls().last().cloned().expect("no call was made")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, call: WireCall) -> TransportOutcome {
        self.calls.lock().unwrap().push(call.clone());
        self.responses
            .lock()
            .unwrap()
            .get_mut(&(call.method, call.path.clone()))
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                TransportOutcome::responded(
                    404,
                    r#"{"error":{"type":"invalid_request","code":"HE_02","message":"Unscripted call"}}"#,
                )
            })
    }
}

/// Transport that never answers
#[derive(Default)]
pub struct HangingTransport {
    pub started: AtomicUsize,
}

#[async_trait]
impl Transport for HangingTransport {
    async fn send(&self, _call: WireCall) -> TransportOutcome {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        TransportOutcome::responded(200, "{}")
    }
}

// ============================================================================
// Webhook doubles
// ============================================================================

/// Counts handler invocations per kind; optionally fails every call
#[derive(Default)]
pub struct RecordingHandlers {
    pub payment_succeeded: AtomicUsize,
    pub payment_failed: AtomicUsize,
    pub refund_succeeded: AtomicUsize,
    pub refund_failed: AtomicUsize,
    pub dispute_opened: AtomicUsize,
    pub unknown: AtomicUsize,
    pub fail: bool,
    pub seen: Mutex<Vec<WebhookEvent>>,
}

impl RecordingHandlers {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn total(&self) -> usize {
        [
            &self.payment_succeeded,
            &self.payment_failed,
            &self.refund_succeeded,
            &self.refund_failed,
            &self.dispute_opened,
            &self.unknown,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    fn record(&self, counter: &AtomicUsize, event: &WebhookEvent) -> anyhow::Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(event.clone());
        if self.fail {
            anyhow::bail!("ledger unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookHandlers for RecordingHandlers {
    async fn payment_succeeded(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.payment_succeeded, event)
    }
    async fn payment_failed(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.payment_failed, event)
    }
    async fn refund_succeeded(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.refund_succeeded, event)
    }
    async fn refund_failed(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.refund_failed, event)
    }
    async fn dispute_opened(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.dispute_opened, event)
    }
    async fn unknown(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        self.record(&self.unknown, event)
    }
}

/// Stalls on its first payment delivery and panics on its first refund
/// delivery; later deliveries succeed.
#[derive(Default)]
pub struct FlakyHandlers {
    pub payment_calls: AtomicUsize,
    pub refund_calls: AtomicUsize,
}

#[async_trait]
impl WebhookHandlers for FlakyHandlers {
    async fn payment_succeeded(&self, _event: &WebhookEvent) -> anyhow::Result<()> {
        if self.payment_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
    async fn refund_succeeded(&self, _event: &WebhookEvent) -> anyhow::Result<()> {
        if self.refund_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("handler crashed");
        }
        Ok(())
    }
}

/// Store whose backend is down
pub struct UnavailableStore;

#[async_trait]
impl IdempotencyStore for UnavailableStore {
    async fn begin(&self, _event_id: &str) -> Result<Claim, GatewayError> {
        Err(GatewayError::IdempotencyStore("connection refused".to_string()))
    }
    async fn complete(&self, _event_id: &str) -> Result<(), GatewayError> {
        Err(GatewayError::IdempotencyStore("connection refused".to_string()))
    }
    async fn release(&self, _event_id: &str) -> Result<(), GatewayError> {
        Err(GatewayError::IdempotencyStore("connection refused".to_string()))
    }
}

pub fn webhook_router(
    config: &GatewayConfig,
    handlers: Arc<RecordingHandlers>,
    store: Arc<dyn IdempotencyStore>,
) -> WebhookRouter {
    WebhookRouter::new(config, handlers, store)
}

/// Full HTTP app over a scripted transport and recording handlers
pub fn app(
    config: &GatewayConfig,
    transport: Arc<MockTransport>,
    handlers: Arc<RecordingHandlers>,
) -> Router {
    let gateway = PaymentGateway::new(config, transport);
    let webhooks = webhook_router(
        config,
        handlers,
        Arc::new(
            InMemoryIdempotencyStore::new(config.dedup_retention)
                .with_claim_lease(config.claim_lease),
        ),
    );
    router(AppState { gateway, webhooks })
}

// ============================================================================
// Helpers
// ============================================================================

/// Read response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Generate HMAC signature header for a webhook payload.
pub fn generate_webhook_signature(payload: &str, timestamp: i64, secret: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Header value signed now with the test secret
pub fn signed_now(payload: &str) -> String {
    generate_webhook_signature(payload, chrono::Utc::now().timestamp(), TEST_WEBHOOK_SECRET)
}
