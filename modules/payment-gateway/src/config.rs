use crate::error::GatewayError;
use std::fmt;
use std::time::Duration;

/// Per-operation-category transport deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Health/status lookups
    pub short: Duration,
    /// Single-entity reads and customer operations
    pub medium: Duration,
    /// Creation, confirmation, refunds, list and analytics
    pub long: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(10),
            medium: Duration::from_secs(15),
            long: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    /// Health and status probes
    Status,
    /// Single-entity lookups and customer operations
    Read,
    /// Creation, confirmation and refunds, plus list and analytics scans
    Mutation,
}

impl TimeoutPolicy {
    pub fn for_category(&self, category: OperationCategory) -> Duration {
        match category {
            OperationCategory::Status => self.short,
            OperationCategory::Read => self.medium,
            OperationCategory::Mutation => self.long,
        }
    }
}

/// How webhook deliveries are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum WebhookVerification {
    Hmac {
        secret: String,
        tolerance_secs: i64,
    },
    /// Operator opted out of signature checks (`WEBHOOK_ALLOW_UNSIGNED=true`).
    Insecure,
}

impl fmt::Debug for WebhookVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookVerification::Hmac { tolerance_secs, .. } => f
                .debug_struct("Hmac")
                .field("secret", &"<redacted>")
                .field("tolerance_secs", tolerance_secs)
                .finish(),
            WebhookVerification::Insecure => f.write_str("Insecure"),
        }
    }
}

/// Whether a failing webhook handler still gets a success acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    #[default]
    AlwaysAcknowledge,
    RequireHandlerSuccess,
}

impl AckPolicy {
    fn parse(raw: &str) -> Result<Self, GatewayError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(AckPolicy::AlwaysAcknowledge),
            "require_success" => Ok(AckPolicy::RequireHandlerSuccess),
            other => Err(GatewayError::Config(format!(
                "WEBHOOK_ACK_POLICY must be 'always' or 'require_success', got '{}'",
                other
            ))),
        }
    }
}

/// Gateway configuration, fixed at startup and passed to constructors.
#[derive(Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub merchant_id: String,
    pub webhook_url: Option<String>,
    pub webhook_verification: WebhookVerification,
    pub ack_policy: AckPolicy,
    pub dedup_retention: Duration,
    /// How long an unfinished webhook claim blocks redeliveries
    pub claim_lease: Duration,
    pub environment: String,
    pub timeouts: TimeoutPolicy,
    pub host: String,
    pub port: u16,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("merchant_id", &self.merchant_id)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_verification", &self.webhook_verification)
            .field("ack_policy", &self.ack_policy)
            .field("dedup_retention", &self.dedup_retention)
            .field("claim_lease", &self.claim_lease)
            .field("environment", &self.environment)
            .field("timeouts", &self.timeouts)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment (and `.env`, if present)
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| GatewayError::Config(format!("Missing {}", key)))
        };

        let api_key = required("PROCESSOR_API_KEY")?;
        let merchant_id = required("PROCESSOR_MERCHANT_ID")?;

        let allow_unsigned = parse_or("WEBHOOK_ALLOW_UNSIGNED", get("WEBHOOK_ALLOW_UNSIGNED"), false)?;
        let tolerance_secs = parse_or(
            "WEBHOOK_SIGNATURE_TOLERANCE_SECS",
            get("WEBHOOK_SIGNATURE_TOLERANCE_SECS"),
            300i64,
        )?;

        let webhook_verification = match (get("PROCESSOR_WEBHOOK_SECRET"), allow_unsigned) {
            (Some(secret), false) => WebhookVerification::Hmac {
                secret,
                tolerance_secs,
            },
            (None, true) => WebhookVerification::Insecure,
            (Some(_), true) => {
                return Err(GatewayError::Config(
                    "PROCESSOR_WEBHOOK_SECRET is set but WEBHOOK_ALLOW_UNSIGNED=true; pick one"
                        .to_string(),
                ))
            }
            (None, false) => {
                return Err(GatewayError::Config(
                    "Missing PROCESSOR_WEBHOOK_SECRET (set WEBHOOK_ALLOW_UNSIGNED=true to accept unsigned webhooks)"
                        .to_string(),
                ))
            }
        };

        let ack_policy = match get("WEBHOOK_ACK_POLICY") {
            Some(raw) => AckPolicy::parse(&raw)?,
            None => AckPolicy::default(),
        };

        let retention_hours: u64 = parse_or(
            "WEBHOOK_DEDUP_RETENTION_HOURS",
            get("WEBHOOK_DEDUP_RETENTION_HOURS"),
            72,
        )?;
        let dedup_retention = retention_hours
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                GatewayError::Config(format!(
                    "WEBHOOK_DEDUP_RETENTION_HOURS is too large: {}",
                    retention_hours
                ))
            })?;
        let claim_lease = Duration::from_secs(parse_or(
            "WEBHOOK_CLAIM_LEASE_SECS",
            get("WEBHOOK_CLAIM_LEASE_SECS"),
            300u64,
        )?);

        let defaults = TimeoutPolicy::default();
        let timeouts = TimeoutPolicy {
            short: Duration::from_secs(parse_or(
                "TIMEOUT_SHORT_SECS",
                get("TIMEOUT_SHORT_SECS"),
                defaults.short.as_secs(),
            )?),
            medium: Duration::from_secs(parse_or(
                "TIMEOUT_MEDIUM_SECS",
                get("TIMEOUT_MEDIUM_SECS"),
                defaults.medium.as_secs(),
            )?),
            long: Duration::from_secs(parse_or(
                "TIMEOUT_LONG_SECS",
                get("TIMEOUT_LONG_SECS"),
                defaults.long.as_secs(),
            )?),
        };

        Ok(GatewayConfig {
            base_url: get("PROCESSOR_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            merchant_id,
            webhook_url: get("PROCESSOR_WEBHOOK_URL"),
            webhook_verification,
            ack_policy,
            dedup_retention,
            claim_lease,
            environment: get("PROCESSOR_ENV").unwrap_or_else(|| "development".to_string()),
            timeouts,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 8090u16)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, GatewayError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| GatewayError::Config(format!("Invalid value for {}: '{}'", key, value))),
        None => Ok(default),
    }
}
