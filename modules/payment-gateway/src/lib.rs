//! Payment processor gateway.
//!
//! Translates between the internal payment domain model and the processor's
//! wire format, classifies processor failures into one error taxonomy, and
//! verifies and dispatches the processor's webhooks.

pub mod classify;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod transport;
pub mod translate;
pub mod webhook;
pub mod wire;

pub use config::{AckPolicy, GatewayConfig, OperationCategory, TimeoutPolicy, WebhookVerification};
pub use error::{ErrorKind, ErrorResponse, GatewayError};
pub use gateway::PaymentGateway;
pub use routes::{router, AppState};
pub use transport::{HttpMethod, ReqwestTransport, Transport, TransportOutcome, WireCall};
pub use webhook::{
    DeliveryState, DispatchOutcome, WebhookEvent, WebhookHandlers, WebhookReceipt, WebhookRouter,
};
