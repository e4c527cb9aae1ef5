//! Bidirectional mapping between the internal domain model and the
//! processor's wire shapes. Everything here is pure: no I/O, no shared state.

pub mod inbound;
pub mod outbound;

pub use inbound::{
    coerce_amount, customer_from_wire, payment_from_wire, refund_from_wire, AmountCoercion,
};
pub use outbound::{customer_to_wire, payment_to_wire, refund_to_wire, OutboundOptions};

/// Metadata key carrying the caller's order reference on the wire
pub const ORDER_ID_KEY: &str = "internal_order_id";
/// Metadata key carrying the caller's user id on the wire
pub const USER_ID_KEY: &str = "internal_user_id";

pub const RESERVED_METADATA_KEYS: [&str; 2] = [ORDER_ID_KEY, USER_ID_KEY];

/// Currency as the processor expects it on requests
pub fn currency_to_wire(currency: &str) -> String {
    currency.trim().to_ascii_lowercase()
}

/// Currency as callers see it on responses
pub fn currency_canonical(currency: &str) -> String {
    currency.trim().to_ascii_uppercase()
}

/// `Some` only for non-blank values; blank optional fields are omitted on the wire
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_currency_is_idempotent() {
        for code in ["USD", "usd", "Eur", " gbp "] {
            let once = currency_canonical(code);
            assert_eq!(currency_canonical(&once), once);
            assert_eq!(once, once.to_ascii_uppercase());
        }
        assert_eq!(currency_canonical("USD"), "USD");
    }

    #[test]
    fn wire_currency_is_idempotent() {
        for code in ["USD", "usd", "JpY"] {
            let once = currency_to_wire(code);
            assert_eq!(currency_to_wire(&once), once);
        }
        assert_eq!(currency_to_wire("USD"), "usd");
    }

    #[test]
    fn blank_values_are_omitted() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(" desc "), Some("desc".to_string()));
    }
}
