//! Processor wire shapes.
//!
//! Requests are strict records that serialize exactly what the processor
//! expects. Responses are tolerant: every field decodes to its zero value
//! when absent or of an unexpected type, and keys this crate does not model
//! are kept in an `extra` map instead of being dropped.

pub mod customer;
pub mod payment;
pub mod refund;

pub use customer::{WireCustomerRequest, WireCustomerResponse};
pub use payment::{
    WireAddress, WireBilling, WireCustomer, WireNextAction, WirePaymentList,
    WirePaymentRequest, WirePaymentResponse,
};
pub use refund::{WireRefundRequest, WireRefundResponse};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Decode a field, falling back to `T::default()` when the value has an
/// unexpected shape. Used with `#[serde(default, deserialize_with = ...)]`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}
