use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `t=<unix seconds>,v1=<hex hmac>`
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

fn rejected(reason: &str) -> GatewayError {
    GatewayError::AuthFailure(format!("webhook signature rejected: {}", reason))
}

/// Verify a webhook signature against the raw body.
///
/// The signed payload is `"<t>.<raw body>"`, MAC'd with HMAC-SHA256 under the
/// shared secret. The timestamp must be within `tolerance_secs` of now.
pub fn verify_signature(
    raw_body: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), GatewayError> {
    verify_signature_at(raw_body, header, secret, tolerance_secs, Utc::now().timestamp())
}

pub(crate) fn verify_signature_at(
    raw_body: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), GatewayError> {
    let header = header.ok_or_else(|| rejected("missing signature header"))?;

    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',').map(str::trim) {
        if let Some(value) = part.strip_prefix("t=") {
            timestamp = Some(value);
        } else if let Some(value) = part.strip_prefix("v1=") {
            signature = Some(value);
        }
    }
    let timestamp = timestamp.ok_or_else(|| rejected("missing timestamp"))?;
    let signature = signature.ok_or_else(|| rejected("missing v1 signature"))?;

    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| rejected("timestamp is not a number"))?;
    let tolerance = u64::try_from(tolerance_secs).unwrap_or(0);
    let skew = now
        .checked_sub(sent_at)
        .map(i64::unsigned_abs)
        .ok_or_else(|| rejected("timestamp outside tolerance"))?;
    if skew > tolerance {
        return Err(rejected("timestamp outside tolerance"));
    }

    let received = hex::decode(signature).map_err(|_| rejected("signature is not hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| rejected("unusable secret"))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    // verify_slice compares in constant time
    mac.verify_slice(&received)
        .map_err(|_| rejected("signature mismatch"))
}

/// Produce a header value for `raw_body` signed at `timestamp`
pub fn sign(raw_body: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
