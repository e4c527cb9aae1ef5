//! Error classification.
//!
//! Every processor call ends in exactly one of: a 2xx body handed back for
//! inbound translation, or one `GatewayError`. Detection runs in priority
//! order (transport, auth, not-found, structured processor error, unknown)
//! and is driven purely by status codes and structured error codes. Message
//! text is carried through for the caller but never inspected.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::GatewayError;
use crate::transport::TransportOutcome;
use crate::wire::lenient;

/// Processor error codes that mean "the referenced entity does not exist",
/// whatever HTTP status they arrive with. Compared case-insensitively.
pub const NOT_FOUND_CODES: &[&str] = &[
    "HE_02",
    "resource_missing",
    "resource_not_found",
    "not_found",
    "payment_not_found",
    "refund_not_found",
    "customer_not_found",
];

/// Longest slice of an unrecognised body echoed back in the error message
const UNKNOWN_BODY_PREVIEW: usize = 256;

/// Error detail extracted from a processor error body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorErrorBody {
    pub kind: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    error_code: String,
    #[serde(default, deserialize_with = "lenient")]
    error_message: String,
    #[serde(default, deserialize_with = "lenient")]
    code: String,
    #[serde(default, deserialize_with = "lenient")]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    kind: String,
    #[serde(default, deserialize_with = "lenient")]
    code: String,
    #[serde(default, deserialize_with = "lenient")]
    message: String,
}

/// Parse one of the processor's error body shapes:
///
/// - `{"error": {"type": .., "code": .., "message": ..}}`
/// - `{"error": "message"}`
/// - `{"error_code": .., "error_message": ..}`
/// - `{"code": .., "message": ..}`
///
/// Returns `None` when the body is not a JSON object or carries neither a
/// code nor a message.
pub fn parse_error_body(body: &str) -> Option<ProcessorErrorBody> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    if !value.is_object() {
        return None;
    }
    let envelope: ErrorEnvelope = serde_json::from_value(value).ok()?;

    let parsed = match envelope.error {
        Some(JsonValue::Object(detail)) => {
            let detail: ErrorDetail =
                serde_json::from_value(JsonValue::Object(detail)).unwrap_or_default();
            ProcessorErrorBody {
                kind: detail.kind,
                code: detail.code,
                message: detail.message,
            }
        }
        Some(JsonValue::String(message)) => ProcessorErrorBody {
            code: first_non_empty(&envelope.error_code, &envelope.code),
            message,
            ..Default::default()
        },
        _ => ProcessorErrorBody {
            code: first_non_empty(&envelope.error_code, &envelope.code),
            message: first_non_empty(&envelope.error_message, &envelope.message),
            ..Default::default()
        },
    };

    if parsed.code.is_empty() && parsed.message.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

fn first_non_empty(primary: &str, secondary: &str) -> String {
    if primary.is_empty() {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}

pub fn is_not_found_code(code: &str) -> bool {
    NOT_FOUND_CODES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(code.trim()))
}

fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}

/// Turn a transport outcome into the 2xx body or a typed error.
///
/// A non-2xx status is never reported as success, whatever the body says.
pub fn classify(outcome: TransportOutcome) -> Result<String, GatewayError> {
    match outcome {
        TransportOutcome::Failed { reason, timed_out } => Err(GatewayError::TransportFailure {
            message: reason,
            timed_out,
        }),
        TransportOutcome::Responded { status, body } if (200..300).contains(&status) => Ok(body),
        TransportOutcome::Responded { status, body } => Err(classify_response(status, &body)),
    }
}

/// Classify a non-2xx processor response
pub fn classify_response(status: u16, body: &str) -> GatewayError {
    let structured = parse_error_body(body);

    if status == 401 || status == 403 {
        let (code, message) = match structured {
            Some(e) => (e.code, e.message),
            None => (String::new(), String::new()),
        };
        let message = if message.is_empty() {
            format!("processor rejected credentials (status {})", status)
        } else {
            message
        };
        return GatewayError::ProcessorAuthFailure {
            status,
            code,
            message,
        };
    }

    let code_says_missing = structured
        .as_ref()
        .is_some_and(|e| is_not_found_code(&e.code));
    if status == 404 || code_says_missing {
        let (code, message) = match structured {
            Some(e) => (e.code, e.message),
            None => (String::new(), String::new()),
        };
        let message = if message.is_empty() {
            "referenced resource does not exist".to_string()
        } else {
            message
        };
        return GatewayError::NotFound { code, message };
    }

    match structured {
        Some(e) => GatewayError::Processor {
            status,
            code: e.code,
            message: e.message,
            retryable: is_retryable_status(status),
        },
        None => GatewayError::Processor {
            status,
            code: String::new(),
            message: unknown_body_message(status, body),
            retryable: is_retryable_status(status),
        },
    }
}

/// Error fields carried inside an otherwise successful payment or refund
/// object (e.g. a declined card), as a typed error
pub fn reported_error(code: Option<&str>, message: Option<&str>) -> Option<GatewayError> {
    let code = code.unwrap_or_default();
    let message = message.unwrap_or_default();
    if code.is_empty() && message.is_empty() {
        return None;
    }
    if is_not_found_code(code) {
        return Some(GatewayError::NotFound {
            code: code.to_string(),
            message: message.to_string(),
        });
    }
    Some(GatewayError::Processor {
        status: 200,
        code: code.to_string(),
        message: message.to_string(),
        retryable: false,
    })
}

fn unknown_body_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("unexpected processor response (status {})", status);
    }
    let preview: String = trimmed.chars().take(UNKNOWN_BODY_PREVIEW).collect();
    format!("unexpected processor response (status {}): {}", status, preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn responded(status: u16, body: &str) -> TransportOutcome {
        TransportOutcome::responded(status, body)
    }

    #[test]
    fn success_returns_body() {
        let body = classify(responded(200, r#"{"payment_id":"p1"}"#)).unwrap();
        assert_eq!(body, r#"{"payment_id":"p1"}"#);
        assert!(classify(responded(201, "")).is_ok());
    }

    #[test]
    fn transport_failure_is_retryable() {
        let err = classify(TransportOutcome::Failed {
            reason: "deadline elapsed".to_string(),
            timed_out: true,
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(err.is_retryable());
    }

    #[test]
    fn credentials_rejection_is_auth_failure() {
        for status in [401, 403] {
            let err = classify(responded(
                status,
                r#"{"error":{"type":"invalid_request","code":"IR_01","message":"API key not provided or invalid API key used"}}"#,
            ))
            .unwrap_err();
            assert_eq!(
                err,
                GatewayError::ProcessorAuthFailure {
                    status,
                    code: "IR_01".to_string(),
                    message: "API key not provided or invalid API key used".to_string(),
                }
            );
            assert_eq!(err.kind(), ErrorKind::AuthFailure);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn not_found_by_status_regardless_of_phrasing() {
        for body in [
            r#"{"error":{"type":"invalid_request","code":"HE_02","message":"Payment does not exist in our records"}}"#,
            r#"{"error_code":"missing","error_message":"No such refund"}"#,
            "<html>gone</html>",
            "",
        ] {
            let err = classify(responded(404, body)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound, "body: {}", body);
        }
    }

    #[test]
    fn not_found_by_structured_code_on_other_status() {
        let err = classify(responded(
            400,
            r#"{"error":{"type":"invalid_request","code":"HE_02","message":"Refund does not exist"}}"#,
        ))
        .unwrap_err();
        assert_eq!(
            err,
            GatewayError::NotFound {
                code: "HE_02".to_string(),
                message: "Refund does not exist".to_string(),
            }
        );

        let err = classify(responded(422, r#"{"code":"Resource_Missing","message":"gone"}"#))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn message_text_alone_never_means_not_found() {
        let err = classify(responded(
            400,
            r#"{"error":{"type":"invalid_request","code":"IR_06","message":"payment not found (404)"}}"#,
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessorError);
    }

    #[test]
    fn structured_error_preserved_verbatim() {
        let err = classify(responded(
            400,
            r#"{"error":{"type":"invalid_request","code":"IR_06","message":"Missing required param: amount"}}"#,
        ))
        .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Processor {
                status: 400,
                code: "IR_06".to_string(),
                message: "Missing required param: amount".to_string(),
                retryable: false,
            }
        );

        let flat = classify(responded(
            502,
            r#"{"error_code":"CE_00","error_message":"Connector timed out"}"#,
        ))
        .unwrap_err();
        assert!(flat.is_retryable());
        assert!(matches!(flat, GatewayError::Processor { ref code, .. } if code == "CE_00"));
    }

    #[test]
    fn rate_limit_is_retryable() {
        let err = classify(responded(429, r#"{"code":"RE_01","message":"slow down"}"#)).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn unknown_shape_is_processor_error_with_empty_code() {
        for (status, body) in [(500, "Internal Server Error"), (400, "[1,2]"), (503, "")] {
            match classify(responded(status, body)).unwrap_err() {
                GatewayError::Processor { code, status: s, .. } => {
                    assert_eq!(code, "");
                    assert_eq!(s, status);
                }
                other => panic!("expected processor error, got {:?}", other),
            }
        }
    }

    #[test]
    fn redirect_or_informational_status_is_not_success() {
        assert!(classify(responded(302, r#"{"payment_id":"p1"}"#)).is_err());
        assert!(classify(responded(100, "")).is_err());
    }

    #[test]
    fn string_error_field_is_used_as_message() {
        let parsed = parse_error_body(r#"{"error":"Unauthorized"}"#).unwrap();
        assert_eq!(parsed.message, "Unauthorized");
        assert_eq!(parsed.code, "");
    }

    #[test]
    fn reported_error_fields_become_typed_errors() {
        assert_eq!(reported_error(None, None), None);
        assert_eq!(reported_error(Some(""), Some("")), None);

        let declined = reported_error(Some("card_declined"), Some("Your card was declined.")).unwrap();
        assert_eq!(declined.kind(), ErrorKind::ProcessorError);
        assert!(!declined.is_retryable());

        let missing = reported_error(Some("HE_02"), None).unwrap();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }
}
