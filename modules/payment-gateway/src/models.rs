use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::classify;
use crate::error::GatewayError;

/// Free-form metadata map carried on payments, refunds and customers
pub type Metadata = serde_json::Map<String, JsonValue>;

// ============================================================================
// PAYMENTS
// ============================================================================

/// Internal payment creation request.
///
/// Fields default when absent so that validation, not deserialization,
/// reports which field is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub user_id: String,
    /// Amount in minor units (e.g. cents)
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub return_url: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
}

impl PaymentRequest {
    /// Reject malformed input before any network call
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.user_id.trim().is_empty() {
            return Err(GatewayError::validation("user_id", "is required"));
        }
        if self.amount <= 0 {
            return Err(GatewayError::validation(
                "amount",
                "must be a positive integer in minor units",
            ));
        }
        validate_currency(&self.currency)?;
        if self.payment_method.trim().is_empty() {
            return Err(GatewayError::validation("payment_method", "is required"));
        }
        Ok(())
    }
}

pub(crate) fn validate_currency(currency: &str) -> Result<(), GatewayError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GatewayError::validation(
            "currency",
            "must be a 3-letter ISO 4217 code",
        ));
    }
    Ok(())
}

/// Customer details attached to a payment request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Postal address (six standard fields)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

/// Payment lifecycle status as reported by the processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Processing,
    Cancelled,
    RequiresCustomerAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    PartiallyCaptured,
    /// Status outside the known catalog, kept verbatim
    Other(String),
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "succeeded" => PaymentStatus::Succeeded,
            "failed" => PaymentStatus::Failed,
            "processing" => PaymentStatus::Processing,
            "cancelled" => PaymentStatus::Cancelled,
            "requires_customer_action" => PaymentStatus::RequiresCustomerAction,
            "requires_payment_method" => PaymentStatus::RequiresPaymentMethod,
            "requires_confirmation" => PaymentStatus::RequiresConfirmation,
            "requires_capture" => PaymentStatus::RequiresCapture,
            "partially_captured" => PaymentStatus::PartiallyCaptured,
            _ => PaymentStatus::Other(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::RequiresCustomerAction => "requires_customer_action",
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::PartiallyCaptured => "partially_captured",
            PaymentStatus::Other(raw) => raw,
        }
    }
}

/// Additional caller action required to complete a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

/// Anomaly noticed while translating a processor response.
///
/// The translation still succeeds; the value it concerns was zeroed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationWarning {
    UnreadableAmount { raw: JsonValue },
    UnparseableTimestamp { field: String, raw: String },
}

/// Caller-facing payment response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub order_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TranslationWarning>,
}

impl PaymentResponse {
    /// Error reported inside the payment object itself (e.g. a decline)
    pub fn reported_error(&self) -> Option<GatewayError> {
        classify::reported_error(self.error_code.as_deref(), self.error_message.as_deref())
    }
}

/// Page of payments
#[derive(Debug, Clone, Serialize)]
pub struct PaymentList {
    pub data: Vec<PaymentResponse>,
    pub count: usize,
}

/// Query parameters for listing payments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPaymentsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub customer_id: Option<String>,
}

impl ListPaymentsQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

// ============================================================================
// REFUNDS
// ============================================================================

/// Internal refund request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub payment_id: String,
    /// Partial amount in minor units; absent or zero refunds the full captured amount
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RefundRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.payment_id.trim().is_empty() {
            return Err(GatewayError::validation("payment_id", "is required"));
        }
        if matches!(self.amount, Some(amount) if amount < 0) {
            return Err(GatewayError::validation("amount", "must not be negative"));
        }
        Ok(())
    }
}

/// Refund lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RefundStatus {
    Succeeded,
    Failed,
    Pending,
    Review,
    Other(String),
}

impl From<String> for RefundStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "succeeded" | "success" => RefundStatus::Succeeded,
            "failed" | "failure" => RefundStatus::Failed,
            "pending" => RefundStatus::Pending,
            "review" => RefundStatus::Review,
            _ => RefundStatus::Other(raw),
        }
    }
}

impl From<RefundStatus> for String {
    fn from(status: RefundStatus) -> Self {
        match status {
            RefundStatus::Succeeded => "succeeded".to_string(),
            RefundStatus::Failed => "failed".to_string(),
            RefundStatus::Pending => "pending".to_string(),
            RefundStatus::Review => "review".to_string(),
            RefundStatus::Other(raw) => raw,
        }
    }
}

/// Caller-facing refund response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundResponse {
    pub refund_id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: RefundStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TranslationWarning>,
}

impl RefundResponse {
    pub fn reported_error(&self) -> Option<GatewayError> {
        classify::reported_error(self.error_code.as_deref(), self.error_message.as_deref())
    }
}

// ============================================================================
// CUSTOMERS
// ============================================================================

/// Request body for creating a customer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerRequest {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CustomerRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        let has_identity = [&self.customer_id, &self.name, &self.email, &self.phone]
            .iter()
            .any(|v| !v.trim().is_empty());
        if !has_identity {
            return Err(GatewayError::validation(
                "customer",
                "one of customer_id, name, email or phone is required",
            ));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(GatewayError::validation("email", "is not a valid address"));
        }
        Ok(())
    }
}

/// Caller-facing customer response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerResponse {
    pub customer_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TranslationWarning>,
}

// ============================================================================
// ACCOUNT LOOKUPS
// ============================================================================

/// Query parameters for payment-method availability
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMethodsQuery {
    pub currency: Option<String>,
    pub country: Option<String>,
}

/// Query parameters for payment analytics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub granularity: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
}

/// Query parameters for connector performance analytics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorAnalyticsQuery {
    pub connector: Option<String>,
}

/// Processor connectivity report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub processor_reachable: bool,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}
