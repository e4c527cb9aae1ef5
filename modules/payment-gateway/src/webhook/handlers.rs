use async_trait::async_trait;

use super::event::{EventKind, WebhookEvent};

/// Caller-supplied reactions to webhook events, one per capability.
///
/// Every method defaults to logging the event, so implementors override only
/// the kinds they care about. Handlers may see events in any order relative
/// to the synchronous API (a `payment_succeeded` can arrive before `confirm`
/// returns).
#[async_trait]
pub trait WebhookHandlers: Send + Sync {
    async fn payment_succeeded(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::info!(
            event_id = %event.event_id,
            payment_id = ?event.payment_id,
            "Payment succeeded"
        );
        Ok(())
    }

    async fn payment_failed(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::warn!(
            event_id = %event.event_id,
            payment_id = ?event.payment_id,
            error_code = ?event.error_code,
            error_message = ?event.error_message,
            "Payment failed"
        );
        Ok(())
    }

    async fn refund_succeeded(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::info!(
            event_id = %event.event_id,
            refund_id = ?event.refund_id,
            payment_id = ?event.payment_id,
            "Refund succeeded"
        );
        Ok(())
    }

    async fn refund_failed(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::warn!(
            event_id = %event.event_id,
            refund_id = ?event.refund_id,
            error_code = ?event.error_code,
            "Refund failed"
        );
        Ok(())
    }

    async fn dispute_opened(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::warn!(
            event_id = %event.event_id,
            dispute_id = ?event.dispute_id,
            payment_id = ?event.payment_id,
            "Dispute opened"
        );
        Ok(())
    }

    async fn unknown(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        tracing::info!(
            event_id = %event.event_id,
            event_type = %event.kind.as_str(),
            "Ignoring unrecognized webhook event"
        );
        Ok(())
    }
}

/// Route an event to the handler for its kind
pub(crate) async fn dispatch<H>(handlers: &H, event: &WebhookEvent) -> anyhow::Result<()>
where
    H: WebhookHandlers + ?Sized,
{
    match event.kind {
        EventKind::PaymentSucceeded => handlers.payment_succeeded(event).await,
        EventKind::PaymentFailed => handlers.payment_failed(event).await,
        EventKind::RefundSucceeded => handlers.refund_succeeded(event).await,
        EventKind::RefundFailed => handlers.refund_failed(event).await,
        EventKind::DisputeOpened => handlers.dispute_opened(event).await,
        EventKind::Unknown(_) => handlers.unknown(event).await,
    }
}

/// Handlers that only log; the default registry
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandlers;

#[async_trait]
impl WebhookHandlers for LoggingHandlers {}
