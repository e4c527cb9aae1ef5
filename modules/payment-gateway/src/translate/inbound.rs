use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{currency_canonical, non_empty, ORDER_ID_KEY, USER_ID_KEY};
use crate::models::{
    Address, CustomerResponse, Metadata, NextAction, PaymentResponse, PaymentStatus,
    RefundResponse, RefundStatus, TranslationWarning,
};
use crate::wire::{WireAddress, WireCustomerResponse, WirePaymentResponse, WireRefundResponse};

/// How a wire amount was turned into minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountCoercion {
    Integer(i64),
    /// Floating point, truncated toward zero
    Float(i64),
    /// Base-10 numeric string
    Text(i64),
    Missing,
    /// Any other representation; the amount is zeroed and flagged
    Unreadable,
}

impl AmountCoercion {
    pub fn value(self) -> i64 {
        match self {
            AmountCoercion::Integer(v) | AmountCoercion::Float(v) | AmountCoercion::Text(v) => v,
            AmountCoercion::Missing | AmountCoercion::Unreadable => 0,
        }
    }
}

/// Coerce a wire amount: integer, then float (truncated), then numeric string
pub fn coerce_amount(raw: Option<&JsonValue>) -> AmountCoercion {
    match raw {
        None | Some(JsonValue::Null) => AmountCoercion::Missing,
        Some(JsonValue::Number(number)) => {
            if let Some(v) = number.as_i64() {
                AmountCoercion::Integer(v)
            } else {
                match number.as_f64().map(f64::trunc) {
                    Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                        AmountCoercion::Float(f as i64)
                    }
                    _ => AmountCoercion::Unreadable,
                }
            }
        }
        Some(JsonValue::String(text)) => match text.parse::<i64>() {
            Ok(v) => AmountCoercion::Text(v),
            Err(_) => AmountCoercion::Unreadable,
        },
        Some(_) => AmountCoercion::Unreadable,
    }
}

fn amount_with_warning(raw: Option<&JsonValue>, warnings: &mut Vec<TranslationWarning>) -> i64 {
    let coerced = coerce_amount(raw);
    if coerced == AmountCoercion::Unreadable {
        let raw = raw.cloned().unwrap_or(JsonValue::Null);
        tracing::warn!(raw = %raw, "Processor amount is not a number; using 0");
        warnings.push(TranslationWarning::UnreadableAmount { raw });
    }
    coerced.value()
}

/// Best-effort RFC 3339 parse; failures yield `None` and a warning, never an error
fn timestamp(
    field: &str,
    raw: &str,
    warnings: &mut Vec<TranslationWarning>,
) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            tracing::warn!(field, raw, "Unparseable processor timestamp");
            warnings.push(TranslationWarning::UnparseableTimestamp {
                field: field.to_string(),
                raw: raw.to_string(),
            });
            None
        }
    }
}

fn metadata_string(metadata: &Metadata, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(JsonValue::as_str)
        .and_then(non_empty)
}

/// Caller-supplied identifier wins; otherwise recover it from correlation metadata
fn correlated(fallback: Option<&str>, metadata: &Metadata, key: &str) -> String {
    fallback
        .and_then(non_empty)
        .or_else(|| metadata_string(metadata, key))
        .unwrap_or_default()
}

/// Map a processor payment object onto the caller-facing response.
///
/// `fallback_user_id` / `fallback_order_id` are the identifiers the caller
/// already knows (empty or `None` on a bare lookup by id).
pub fn payment_from_wire(
    wire: WirePaymentResponse,
    fallback_user_id: Option<&str>,
    fallback_order_id: Option<&str>,
) -> PaymentResponse {
    let mut warnings = Vec::new();

    let amount = amount_with_warning(wire.amount.as_ref(), &mut warnings);
    let created_at = timestamp("created", &wire.created, &mut warnings);
    let updated_at = timestamp("last_modified", &wire.last_modified, &mut warnings);

    let user_id = correlated(fallback_user_id, &wire.metadata, USER_ID_KEY);
    let order_id = correlated(fallback_order_id, &wire.metadata, ORDER_ID_KEY);

    let next_action = wire.next_action.map(|action| NextAction {
        kind: action.kind,
        redirect_to_url: non_empty(&action.redirect_to_url),
        data: action.data,
    });

    PaymentResponse {
        payment_id: wire.payment_id,
        status: PaymentStatus::from(wire.status),
        amount,
        currency: currency_canonical(&wire.currency),
        payment_method: wire.payment_method,
        user_id,
        order_id,
        description: wire.description,
        client_secret: non_empty(&wire.client_secret),
        next_action,
        error_code: non_empty(&wire.error_code),
        error_message: non_empty(&wire.error_message),
        created_at,
        updated_at,
        metadata: wire.metadata,
        warnings,
    }
}

/// Map a processor refund object onto the caller-facing response
pub fn refund_from_wire(wire: WireRefundResponse) -> RefundResponse {
    let mut warnings = Vec::new();

    let amount = amount_with_warning(wire.amount.as_ref(), &mut warnings);
    let created_at = timestamp("created", &wire.created, &mut warnings);
    let updated_at = timestamp("last_modified", &wire.last_modified, &mut warnings);

    RefundResponse {
        refund_id: wire.refund_id,
        payment_id: wire.payment_id,
        amount,
        currency: currency_canonical(&wire.currency),
        status: RefundStatus::from(wire.status),
        reason: wire.reason,
        error_code: non_empty(&wire.error_code),
        error_message: non_empty(&wire.error_message),
        created_at,
        updated_at,
        metadata: wire.metadata,
        warnings,
    }
}

/// Map a processor customer object onto the caller-facing response
pub fn customer_from_wire(wire: WireCustomerResponse) -> CustomerResponse {
    let mut warnings = Vec::new();
    let created_at = timestamp("created_at", &wire.created_at, &mut warnings);

    CustomerResponse {
        customer_id: wire.customer_id,
        name: wire.name,
        email: wire.email,
        phone: wire.phone,
        description: wire.description,
        address: wire.address.map(address_from_wire),
        created_at,
        metadata: wire.metadata,
        warnings,
    }
}

fn address_from_wire(address: WireAddress) -> Address {
    Address {
        line1: address.line1,
        line2: address.line2,
        city: address.city,
        state: address.state,
        zip: address.zip,
        country: address.country,
    }
}
