use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::lenient;
use crate::models::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireCustomer {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireAddress {
    #[serde(default, deserialize_with = "lenient")]
    pub line1: String,
    #[serde(default, deserialize_with = "lenient")]
    pub line2: String,
    #[serde(default, deserialize_with = "lenient")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient")]
    pub zip: String,
    #[serde(default, deserialize_with = "lenient")]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireBilling {
    pub address: WireAddress,
}

/// Body of the processor's create-payment call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePaymentRequest {
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub customer: WireCustomer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<WireBilling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub capture_method: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WireNextAction {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient")]
    pub redirect_to_url: String,
    #[serde(default)]
    pub data: Option<JsonValue>,
}

/// Processor payment object as returned by create/get/confirm/list
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WirePaymentResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub payment_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: String,
    /// Kept raw: the processor has been seen sending integers, floats and strings
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "lenient")]
    pub created: String,
    #[serde(default, deserialize_with = "lenient")]
    pub last_modified: String,
    #[serde(default, deserialize_with = "lenient")]
    pub client_secret: String,
    #[serde(default, deserialize_with = "lenient")]
    pub next_action: Option<WireNextAction>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_code: String,
    #[serde(default, deserialize_with = "lenient")]
    pub error_message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// List envelope; some deployments return a bare array instead
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WirePaymentList {
    Envelope {
        #[serde(default)]
        data: Vec<WirePaymentResponse>,
    },
    Bare(Vec<WirePaymentResponse>),
}

impl WirePaymentList {
    pub fn into_items(self) -> Vec<WirePaymentResponse> {
        match self {
            WirePaymentList::Envelope { data } => data,
            WirePaymentList::Bare(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_tolerates_variant_types_and_keeps_unknown_keys() {
        let wire: WirePaymentResponse = serde_json::from_value(json!({
            "payment_id": "pay_1",
            "status": 42,
            "amount": "1000",
            "metadata": "not-a-map",
            "next_action": "redirect",
            "connector": "stripe",
            "attempt_count": 2
        }))
        .unwrap();

        assert_eq!(wire.payment_id, "pay_1");
        assert_eq!(wire.status, "");
        assert_eq!(wire.amount, Some(json!("1000")));
        assert!(wire.metadata.is_empty());
        assert_eq!(wire.next_action, None);
        assert_eq!(wire.extra.get("connector"), Some(&json!("stripe")));
        assert_eq!(wire.extra.get("attempt_count"), Some(&json!(2)));
    }

    #[test]
    fn list_accepts_envelope_or_bare_array() {
        let envelope: WirePaymentList =
            serde_json::from_value(json!({"count": 1, "data": [{"payment_id": "p1"}]})).unwrap();
        assert_eq!(envelope.into_items().len(), 1);

        let bare: WirePaymentList =
            serde_json::from_value(json!([{"payment_id": "p1"}, {"payment_id": "p2"}])).unwrap();
        assert_eq!(bare.into_items().len(), 2);
    }
}
