use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::lenient;
use crate::models::Metadata;

/// Body of the processor's create-refund call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireRefundRequest {
    pub payment_id: String,
    /// Omitted for a full refund of the captured amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WireRefundResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub refund_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub payment_id: String,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient")]
    pub reason: String,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "lenient")]
    pub error_code: String,
    #[serde(default, deserialize_with = "lenient")]
    pub error_message: String,
    #[serde(default, deserialize_with = "lenient")]
    pub created: String,
    #[serde(default, deserialize_with = "lenient")]
    pub last_modified: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}
