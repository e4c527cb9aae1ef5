use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One processor call, fully described before it leaves the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct WireCall {
    pub method: HttpMethod,
    /// Path relative to the processor base URL, e.g. `/payments/pay_1`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
    /// Logged on both sides and sent as `x-request-id`
    pub correlation_id: Uuid,
}

impl WireCall {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn post(path: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// What came back from the processor, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    /// The processor answered; any status, any body
    Responded { status: u16, body: String },
    /// The call never produced a response
    Failed { reason: String, timed_out: bool },
}

impl TransportOutcome {
    pub fn responded(status: u16, body: impl Into<String>) -> Self {
        TransportOutcome::Responded {
            status,
            body: body.into(),
        }
    }
}

/// Executes processor calls.
///
/// Implementations own connection pooling and any retry policy; the gateway
/// never retries on its own. Must be safe for concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: WireCall) -> TransportOutcome;
}

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    base_url: String,
    api_key: String,
    merchant_id: String,
    http_client: Client,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Build a transport for the configured processor.
    ///
    /// No client-level timeout is set: deadlines are per operation category
    /// and enforced by the gateway.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            merchant_id: config.merchant_id.clone(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, call: WireCall) -> TransportOutcome {
        let url = format!("{}{}", self.base_url, call.path);
        let mut request = match call.method {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self.http_client.post(&url),
        }
        .header("Accept", "application/json")
        .header("api-key", &self.api_key)
        .header("x-merchant-id", &self.merchant_id)
        .header("x-request-id", call.correlation_id.to_string());

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return TransportOutcome::Failed {
                    reason: e.to_string(),
                    timed_out: e.is_timeout(),
                }
            }
        };

        let status = response.status().as_u16();
        tracing::debug!(
            correlation_id = %call.correlation_id,
            method = %call.method,
            path = %call.path,
            status,
            "Processor responded"
        );

        match response.text().await {
            Ok(body) => TransportOutcome::Responded { status, body },
            Err(e) => TransportOutcome::Failed {
                reason: format!("reading response body: {}", e),
                timed_out: e.is_timeout(),
            },
        }
    }
}
