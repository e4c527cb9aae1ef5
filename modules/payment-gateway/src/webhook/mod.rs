//! Webhook intake: verify, parse, deduplicate, dispatch, acknowledge.
//!
//! A delivery moves `Received → Verified → Parsed → Dispatched → Acknowledged`.
//! Signature and envelope failures end in `Rejected` before any handler runs.
//! Unknown event kinds are dispatched to the `unknown` handler, never rejected.

pub mod event;
pub mod handlers;
pub mod idempotency;
pub mod signature;

pub use event::{EventKind, WebhookEvent};
pub use handlers::{LoggingHandlers, WebhookHandlers};
pub use idempotency::{Claim, IdempotencyStore, InMemoryIdempotencyStore};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};

use serde::Serialize;
use std::sync::Arc;

use crate::config::{AckPolicy, GatewayConfig, WebhookVerification};
use crate::error::GatewayError;

/// Where a delivery is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Received,
    Verified,
    Parsed,
    Dispatched,
    Acknowledged,
    Rejected,
}

/// What happened to an acknowledged delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The handler ran and succeeded
    Handled,
    /// The handler failed; acknowledged anyway under `AckPolicy::AlwaysAcknowledge`
    HandlerFailed { message: String },
    /// Same event id seen before; no handler was invoked
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookReceipt {
    pub event_id: String,
    pub kind: EventKind,
    pub state: DeliveryState,
    pub outcome: DispatchOutcome,
}

#[derive(Clone)]
pub struct WebhookRouter {
    verification: WebhookVerification,
    ack_policy: AckPolicy,
    handlers: Arc<dyn WebhookHandlers>,
    store: Arc<dyn IdempotencyStore>,
}

impl WebhookRouter {
    pub fn new(
        config: &GatewayConfig,
        handlers: Arc<dyn WebhookHandlers>,
        store: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            verification: config.webhook_verification.clone(),
            ack_policy: config.ack_policy,
            handlers,
            store,
        }
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn ack_policy(&self) -> AckPolicy {
        self.ack_policy
    }

    /// Process one delivery.
    ///
    /// `Ok` means acknowledge. `Err` carries the rejection: `AuthFailure` for a
    /// bad signature, `MalformedWebhook` for an unusable envelope,
    /// `IdempotencyStore` when deduplication is unavailable, and
    /// `DispatchFailed` when a handler failed under
    /// `AckPolicy::RequireHandlerSuccess`.
    pub async fn handle(
        &self,
        signature: Option<&str>,
        raw_body: &[u8],
    ) -> Result<WebhookReceipt, GatewayError> {
        tracing::debug!(state = ?DeliveryState::Received, bytes = raw_body.len(), "Webhook delivery");

        self.verify(signature, raw_body).inspect_err(|e| {
            tracing::warn!(state = ?DeliveryState::Rejected, error = %e, "Webhook rejected");
        })?;

        let event = WebhookEvent::parse(raw_body).inspect_err(|e| {
            tracing::warn!(state = ?DeliveryState::Rejected, error = %e, "Webhook rejected");
        })?;

        tracing::info!(
            state = ?DeliveryState::Parsed,
            event_id = %event.event_id,
            event_type = %event.kind.as_str(),
            "Webhook parsed"
        );

        match self.store.begin(&event.event_id).await {
            Ok(Claim::Claimed) => {}
            Ok(claim) => {
                tracing::info!(
                    event_id = %event.event_id,
                    ?claim,
                    "Duplicate webhook delivery acknowledged without dispatch"
                );
                return Ok(receipt(event, DispatchOutcome::Duplicate));
            }
            Err(e) => {
                tracing::error!(event_id = %event.event_id, error = %e, "Idempotency store unavailable");
                return Err(e);
            }
        }

        let mut claim = ClaimGuard::new(self.store.clone(), &event.event_id);
        let dispatched = handlers::dispatch(self.handlers.as_ref(), &event).await;
        tracing::debug!(state = ?DeliveryState::Dispatched, event_id = %event.event_id, "Webhook dispatched");

        match dispatched {
            Ok(()) => {
                if let Err(e) = self.store.complete(&event.event_id).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        error = %e,
                        "Handled webhook could not be marked complete"
                    );
                }
                claim.settle();
                Ok(receipt(event, DispatchOutcome::Handled))
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(
                    event_id = %event.event_id,
                    event_type = %event.kind.as_str(),
                    error = %message,
                    ack_policy = ?self.ack_policy,
                    "Webhook handler failed"
                );
                if let Err(release_err) = self.store.release(&event.event_id).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        error = %release_err,
                        "Failed to release webhook claim"
                    );
                }
                claim.settle();

                match self.ack_policy {
                    AckPolicy::AlwaysAcknowledge => {
                        Ok(receipt(event, DispatchOutcome::HandlerFailed { message }))
                    }
                    AckPolicy::RequireHandlerSuccess => Err(GatewayError::DispatchFailed {
                        event_id: event.event_id,
                        message,
                    }),
                }
            }
        }
    }

    fn verify(&self, signature: Option<&str>, raw_body: &[u8]) -> Result<(), GatewayError> {
        match &self.verification {
            WebhookVerification::Hmac {
                secret,
                tolerance_secs,
            } => verify_signature(raw_body, signature, secret, *tolerance_secs),
            WebhookVerification::Insecure => {
                tracing::debug!("Webhook signature check skipped (unsigned webhooks allowed)");
                Ok(())
            }
        }
    }
}

/// Releases a claim whose delivery was dropped or panicked before settling.
struct ClaimGuard {
    store: Arc<dyn IdempotencyStore>,
    event_id: Option<String>,
}

impl ClaimGuard {
    fn new(store: Arc<dyn IdempotencyStore>, event_id: &str) -> Self {
        Self {
            store,
            event_id: Some(event_id.to_string()),
        }
    }

    fn settle(&mut self) {
        self.event_id = None;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        let Some(event_id) = self.event_id.take() else {
            return;
        };
        tracing::warn!(event_id = %event_id, "Webhook delivery abandoned mid-dispatch; releasing claim");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(event_id = %event_id, "No runtime to release claim; it expires with its lease");
            return;
        };
        let store = self.store.clone();
        runtime.spawn(async move {
            if let Err(e) = store.release(&event_id).await {
                tracing::error!(event_id = %event_id, error = %e, "Failed to release abandoned webhook claim");
            }
        });
    }
}

fn receipt(event: WebhookEvent, outcome: DispatchOutcome) -> WebhookReceipt {
    tracing::debug!(state = ?DeliveryState::Acknowledged, event_id = %event.event_id, "Webhook acknowledged");
    WebhookReceipt {
        event_id: event.event_id,
        kind: event.kind,
        state: DeliveryState::Acknowledged,
        outcome,
    }
}
