use serde_json::Value as JsonValue;

use super::{currency_to_wire, non_empty, ORDER_ID_KEY, RESERVED_METADATA_KEYS, USER_ID_KEY};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::models::{Address, CustomerRequest, PaymentRequest, RefundRequest};
use crate::wire::{
    WireAddress, WireBilling, WireCustomer, WireCustomerRequest, WirePaymentRequest,
    WireRefundRequest,
};

/// Deployment-level values injected into every outbound payment
#[derive(Debug, Clone, Default)]
pub struct OutboundOptions {
    /// Where the processor should deliver webhooks for this payment
    pub webhook_url: Option<String>,
}

impl From<&GatewayConfig> for OutboundOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            webhook_url: config.webhook_url.as_deref().and_then(non_empty),
        }
    }
}

/// Map an internal payment request onto the processor's create-payment body
pub fn payment_to_wire(
    req: &PaymentRequest,
    options: &OutboundOptions,
) -> Result<WirePaymentRequest, GatewayError> {
    req.validate()?;

    if let Some(key) = RESERVED_METADATA_KEYS
        .iter()
        .find(|key| req.metadata.contains_key(**key))
    {
        return Err(GatewayError::validation(
            format!("metadata.{}", key),
            "is reserved for correlation and cannot be supplied by the caller",
        ));
    }

    let mut metadata = req.metadata.clone();
    metadata.insert(
        USER_ID_KEY.to_string(),
        JsonValue::String(req.user_id.clone()),
    );
    if let Some(order_id) = non_empty(&req.order_id) {
        metadata.insert(ORDER_ID_KEY.to_string(), JsonValue::String(order_id));
    }

    // The processor always gets a customer identity, keyed by the caller id.
    let (customer, billing) = match &req.customer_info {
        Some(info) => (
            WireCustomer {
                id: req.user_id.clone(),
                name: non_empty(&info.name),
                email: non_empty(&info.email),
                phone: non_empty(&info.phone),
            },
            info.address.as_ref().map(|address| WireBilling {
                address: address_to_wire(address),
            }),
        ),
        None => (
            WireCustomer {
                id: req.user_id.clone(),
                name: None,
                email: None,
                phone: None,
            },
            None,
        ),
    };

    Ok(WirePaymentRequest {
        amount: req.amount,
        currency: currency_to_wire(&req.currency),
        payment_method: req.payment_method.trim().to_string(),
        customer,
        billing,
        description: non_empty(&req.description),
        metadata,
        return_url: non_empty(&req.return_url),
        webhook_url: options.webhook_url.clone(),
        capture_method: "automatic",
    })
}

/// Map an internal refund request onto the processor's create-refund body
pub fn refund_to_wire(req: &RefundRequest) -> Result<WireRefundRequest, GatewayError> {
    req.validate()?;

    Ok(WireRefundRequest {
        payment_id: req.payment_id.trim().to_string(),
        // Zero means "refund everything", which the processor spells as omission.
        amount: req.amount.filter(|amount| *amount > 0),
        reason: non_empty(&req.reason),
        metadata: req.metadata.clone(),
    })
}

/// Map an internal customer request onto the processor's create-customer body
pub fn customer_to_wire(req: &CustomerRequest) -> Result<WireCustomerRequest, GatewayError> {
    req.validate()?;

    Ok(WireCustomerRequest {
        customer_id: non_empty(&req.customer_id),
        name: non_empty(&req.name),
        email: non_empty(&req.email),
        phone: non_empty(&req.phone),
        description: non_empty(&req.description),
        address: req.address.as_ref().map(address_to_wire),
        metadata: req.metadata.clone(),
    })
}

fn address_to_wire(address: &Address) -> WireAddress {
    WireAddress {
        line1: address.line1.trim().to_string(),
        line2: address.line2.trim().to_string(),
        city: address.city.trim().to_string(),
        state: address.state.trim().to_string(),
        zip: address.zip.trim().to_string(),
        country: address.country.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerInfo;
    use serde_json::json;

    fn scenario_request() -> PaymentRequest {
        PaymentRequest {
            user_id: "u1".to_string(),
            amount: 1000,
            currency: "usd".to_string(),
            payment_method: "card".to_string(),
            order_id: "o1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn scenario_request_maps_to_wire() {
        let wire = payment_to_wire(&scenario_request(), &OutboundOptions::default()).unwrap();
        let body = serde_json::to_value(&wire).unwrap();

        assert_eq!(body["amount"], json!(1000));
        assert_eq!(body["currency"], "usd");
        assert_eq!(body["customer"]["id"], "u1");
        assert_eq!(body["metadata"]["internal_order_id"], "o1");
        assert_eq!(body["metadata"]["internal_user_id"], "u1");
        assert_eq!(body["capture_method"], "automatic");
    }

    #[test]
    fn empty_optional_fields_are_omitted_not_null() {
        let wire = payment_to_wire(&scenario_request(), &OutboundOptions::default()).unwrap();
        let body = serde_json::to_value(&wire).unwrap();
        let object = body.as_object().unwrap();

        for key in ["description", "return_url", "webhook_url", "billing"] {
            assert!(!object.contains_key(key), "{} should be omitted", key);
        }
        assert_eq!(body["customer"], json!({"id": "u1"}));
    }

    #[test]
    fn uppercase_currency_is_lowercased_and_amount_untouched() {
        let req = PaymentRequest {
            currency: "EUR".to_string(),
            amount: 123_456_789_012,
            ..scenario_request()
        };
        let wire = payment_to_wire(&req, &OutboundOptions::default()).unwrap();
        assert_eq!(wire.currency, "eur");
        assert_eq!(wire.amount, 123_456_789_012);
    }

    #[test]
    fn customer_info_and_address_become_customer_and_billing() {
        let req = PaymentRequest {
            return_url: "https://shop.example.com/return".to_string(),
            description: "Order o1".to_string(),
            customer_info: Some(CustomerInfo {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: String::new(),
                address: Some(Address {
                    line1: "1 Main St".to_string(),
                    line2: String::new(),
                    city: "Springfield".to_string(),
                    state: "IL".to_string(),
                    zip: "62701".to_string(),
                    country: "US".to_string(),
                }),
            }),
            ..scenario_request()
        };
        let options = OutboundOptions {
            webhook_url: Some("https://gw.example.com/hooks".to_string()),
        };

        let body = serde_json::to_value(payment_to_wire(&req, &options).unwrap()).unwrap();

        assert_eq!(
            body["customer"],
            json!({"id": "u1", "name": "Jane Doe", "email": "jane@example.com"})
        );
        assert_eq!(
            body["billing"]["address"],
            json!({
                "line1": "1 Main St",
                "line2": "",
                "city": "Springfield",
                "state": "IL",
                "zip": "62701",
                "country": "US"
            })
        );
        assert_eq!(body["return_url"], "https://shop.example.com/return");
        assert_eq!(body["webhook_url"], "https://gw.example.com/hooks");
        assert_eq!(body["description"], "Order o1");
    }

    #[test]
    fn caller_metadata_is_kept_alongside_correlation_keys() {
        let mut req = scenario_request();
        req.metadata.insert("campaign".to_string(), json!("spring"));

        let wire = payment_to_wire(&req, &OutboundOptions::default()).unwrap();
        assert_eq!(wire.metadata.get("campaign"), Some(&json!("spring")));
        assert_eq!(wire.metadata.len(), 3);
    }

    #[test]
    fn reserved_metadata_key_collision_is_rejected() {
        for key in RESERVED_METADATA_KEYS {
            let mut req = scenario_request();
            req.metadata.insert(key.to_string(), json!("spoofed"));

            match payment_to_wire(&req, &OutboundOptions::default()) {
                Err(GatewayError::Validation { field, .. }) => {
                    assert_eq!(field, format!("metadata.{}", key))
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn order_key_absent_without_order_reference() {
        let req = PaymentRequest {
            order_id: String::new(),
            ..scenario_request()
        };
        let wire = payment_to_wire(&req, &OutboundOptions::default()).unwrap();
        assert!(!wire.metadata.contains_key(ORDER_ID_KEY));
        assert_eq!(wire.metadata.get(USER_ID_KEY), Some(&json!("u1")));
    }

    #[test]
    fn zero_or_absent_refund_amount_means_full_refund() {
        for amount in [None, Some(0)] {
            let req = RefundRequest {
                payment_id: "pay_1".to_string(),
                amount,
                ..Default::default()
            };
            let body = serde_json::to_value(refund_to_wire(&req).unwrap()).unwrap();
            assert!(body.get("amount").is_none());
            assert!(body.get("reason").is_none());
        }

        let partial = RefundRequest {
            payment_id: "pay_1".to_string(),
            amount: Some(500),
            reason: "duplicate".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(refund_to_wire(&partial).unwrap()).unwrap();
        assert_eq!(body["amount"], json!(500));
        assert_eq!(body["reason"], "duplicate");
    }

    #[test]
    fn customer_request_omits_blank_fields() {
        let req = CustomerRequest {
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(customer_to_wire(&req).unwrap()).unwrap();
        assert_eq!(body, json!({"name": "Jane", "email": "jane@example.com"}));
    }
}
