//! `PaymentGateway`: the caller-facing operations.
//!
//! Each operation validates and translates its input, sends one `WireCall`
//! through the transport under the deadline for its category, classifies the
//! outcome and translates the 2xx body back into the domain model. No call is
//! retried here.

mod account;
mod customers;
mod payments;
mod refunds;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::classify::classify;
use crate::config::{GatewayConfig, OperationCategory, TimeoutPolicy};
use crate::error::GatewayError;
use crate::transport::{ReqwestTransport, Transport, TransportOutcome, WireCall};
use crate::translate::OutboundOptions;

#[derive(Clone)]
pub struct PaymentGateway {
    transport: Arc<dyn Transport>,
    timeouts: TimeoutPolicy,
    outbound: OutboundOptions,
    cancel: Option<CancellationToken>,
}

impl PaymentGateway {
    pub fn new(config: &GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeouts: config.timeouts,
            outbound: OutboundOptions::from(config),
            cancel: None,
        }
    }

    /// Gateway talking HTTP to the configured processor
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// A handle whose calls are abandoned once `token` is cancelled
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Send one call and return its 2xx body, or the classified error
    async fn execute(
        &self,
        category: OperationCategory,
        call: WireCall,
    ) -> Result<String, GatewayError> {
        let deadline = self.timeouts.for_category(category);
        let correlation_id = call.correlation_id;
        let method = call.method;
        let path = call.path.clone();

        tracing::debug!(%correlation_id, %method, %path, ?category, "Calling processor");

        let send = tokio::time::timeout(deadline, self.transport.send(call));
        let outcome = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => TransportOutcome::Failed {
                    reason: "call cancelled by caller".to_string(),
                    timed_out: false,
                },
                sent = send => deadline_outcome(sent, deadline),
            },
            None => deadline_outcome(send.await, deadline),
        };

        let result = classify(outcome);
        match &result {
            Ok(_) => {}
            Err(e @ GatewayError::NotFound { .. }) => {
                tracing::info!(%correlation_id, %method, %path, error = %e, "Processor resource not found");
            }
            Err(e) => {
                tracing::error!(
                    %correlation_id,
                    %method,
                    %path,
                    kind = ?e.kind(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Processor call failed"
                );
            }
        }
        result
    }

    /// `execute`, then decode the body into a wire record
    async fn execute_json<W: DeserializeOwned>(
        &self,
        category: OperationCategory,
        call: WireCall,
    ) -> Result<W, GatewayError> {
        let body = self.execute(category, call).await?;
        decode(&body)
    }
}

fn deadline_outcome(
    sent: Result<TransportOutcome, tokio::time::error::Elapsed>,
    deadline: Duration,
) -> TransportOutcome {
    sent.unwrap_or_else(|_| TransportOutcome::Failed {
        reason: format!("processor did not answer within {}s", deadline.as_secs_f64()),
        timed_out: true,
    })
}

/// A 2xx body we cannot read is reported as a processor error with no code
fn decode<W: DeserializeOwned>(body: &str) -> Result<W, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Processor {
        status: 200,
        code: String::new(),
        message: format!("unreadable processor response: {}", e),
        retryable: false,
    })
}

fn to_body<T: Serialize>(value: &T) -> Result<JsonValue, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::validation("body", e.to_string()))
}

/// Validate an identifier before it is placed in a processor URL path
fn path_id<'a>(field: &str, id: &'a str) -> Result<&'a str, GatewayError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(GatewayError::validation(field, "is required"));
    }
    if id
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
    {
        return Err(GatewayError::validation(field, "contains characters not allowed in an id"));
    }
    Ok(id)
}
