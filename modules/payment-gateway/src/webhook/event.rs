use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::error::GatewayError;

/// Envelope keys that may carry the event kind, in lookup order
const KIND_KEYS: &[&str] = &["event_type", "type"];

/// Event kind, mapped onto the fixed handler capability set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum EventKind {
    PaymentSucceeded,
    PaymentFailed,
    RefundSucceeded,
    RefundFailed,
    DisputeOpened,
    /// Anything outside the known catalog, kept verbatim
    Unknown(String),
}

impl EventKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "payment_succeeded" => EventKind::PaymentSucceeded,
            "payment_failed" => EventKind::PaymentFailed,
            "refund_succeeded" => EventKind::RefundSucceeded,
            "refund_failed" => EventKind::RefundFailed,
            "dispute_opened" => EventKind::DisputeOpened,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PaymentSucceeded => "payment_succeeded",
            EventKind::PaymentFailed => "payment_failed",
            EventKind::RefundSucceeded => "refund_succeeded",
            EventKind::RefundFailed => "refund_failed",
            EventKind::DisputeOpened => "dispute_opened",
            EventKind::Unknown(raw) => raw,
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A parsed webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    /// Dedup key: `event_id`, then `id`, else `sha256:<hex of raw body>`
    pub event_id: String,
    pub kind: EventKind,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
    pub dispute_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    /// The full decoded envelope
    pub payload: JsonValue,
}

impl WebhookEvent {
    /// Decode a verified body. Fails only when the body is not a JSON object
    /// or has no event-kind field; unknown kinds parse fine.
    pub fn parse(raw_body: &[u8]) -> Result<Self, GatewayError> {
        let payload: JsonValue = serde_json::from_slice(raw_body)
            .map_err(|e| GatewayError::MalformedWebhook(format!("body is not JSON: {}", e)))?;

        let envelope = payload
            .as_object()
            .ok_or_else(|| GatewayError::MalformedWebhook("body is not a JSON object".to_string()))?;

        let kind = KIND_KEYS
            .iter()
            .find_map(|key| envelope.get(*key).and_then(JsonValue::as_str))
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(EventKind::parse)
            .ok_or_else(|| GatewayError::MalformedWebhook("missing event_type".to_string()))?;

        let event_id = ["event_id", "id"]
            .iter()
            .find_map(|key| string_field(&payload, key))
            .unwrap_or_else(|| derived_event_id(raw_body));

        Ok(WebhookEvent {
            event_id,
            kind,
            payment_id: entity_field(&payload, "payment_id"),
            refund_id: entity_field(&payload, "refund_id"),
            dispute_id: entity_field(&payload, "dispute_id"),
            error_code: entity_field(&payload, "error_code"),
            error_message: entity_field(&payload, "error_message"),
            payload,
        })
    }
}

fn string_field(value: &JsonValue, key: &str) -> Option<String> {
    match value.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Top level first, then the processor's nested `content.object`
fn entity_field(payload: &JsonValue, key: &str) -> Option<String> {
    string_field(payload, key).or_else(|| {
        payload
            .pointer("/content/object")
            .and_then(|object| string_field(object, key))
    })
}

/// Stable id for deliveries without one, so identical redeliveries dedup
fn derived_event_id(raw_body: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(raw_body)))
}
