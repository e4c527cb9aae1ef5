use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::lenient;
use super::payment::WireAddress;
use crate::models::Metadata;

/// Body of the processor's create-customer call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireCustomerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<WireAddress>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WireCustomerResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub customer_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<WireAddress>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}
