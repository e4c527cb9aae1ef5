//! Webhook deduplication contract.
//!
//! Deliveries are at-least-once. A handler with side effects must see each
//! event id once, so the router claims the id before dispatch and marks it
//! complete afterwards. An unfinished claim is a lease: once it lapses, a
//! redelivery may claim the event again. A durable store belongs to the
//! deployment; the in-memory store here covers a single process and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::GatewayError;

/// Result of trying to claim an event id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First sighting: the caller owns the event and must complete or release it
    Claimed,
    /// A previous delivery already produced the side effect
    AlreadyProcessed,
    /// Another delivery of the same event holds an unexpired claim
    InFlight,
}

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically claim `event_id` for processing. An in-flight claim older
    /// than the store's lease is taken over and reported as `Claimed`.
    async fn begin(&self, event_id: &str) -> Result<Claim, GatewayError>;

    /// Record that the side effect happened; later claims see `AlreadyProcessed`
    async fn complete(&self, event_id: &str) -> Result<(), GatewayError>;

    /// Drop a claim without completing it so a redelivery can try again
    async fn release(&self, event_id: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    InFlight,
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct Record {
    state: RecordState,
    touched_at: Instant,
}

pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(300);

/// Process-local store. Records expire `retention` after their last update,
/// which should be at least the processor's redelivery window.
#[derive(Clone)]
pub struct InMemoryIdempotencyStore {
    records: Arc<Mutex<HashMap<String, Record>>>,
    retention: Duration,
    claim_lease: Duration,
}

impl InMemoryIdempotencyStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            retention,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    /// Set how long an in-flight claim blocks other deliveries
    pub fn with_claim_lease(mut self, claim_lease: Duration) -> Self {
        self.claim_lease = claim_lease;
        self
    }

    /// Number of live records (expired ones are pruned first)
    pub async fn len(&self) -> usize {
        let mut records = self.records.lock().await;
        self.prune(&mut records);
        records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn prune(&self, records: &mut HashMap<String, Record>) {
        let retention = self.retention;
        records.retain(|_, record| record.touched_at.elapsed() < retention);
    }
}

impl Default for InMemoryIdempotencyStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(72 * 3600))
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn begin(&self, event_id: &str) -> Result<Claim, GatewayError> {
        let mut records = self.records.lock().await;
        self.prune(&mut records);

        let existing = records
            .get(event_id)
            .map(|record| (record.state, record.touched_at.elapsed()));
        match existing {
            Some((RecordState::Completed, _)) => Ok(Claim::AlreadyProcessed),
            Some((RecordState::InFlight, held)) if held < self.claim_lease => Ok(Claim::InFlight),
            stale => {
                if let Some((_, held)) = stale {
                    tracing::warn!(
                        event_id,
                        held_secs = held.as_secs(),
                        "Taking over webhook claim whose lease lapsed"
                    );
                }
                records.insert(
                    event_id.to_string(),
                    Record {
                        state: RecordState::InFlight,
                        touched_at: Instant::now(),
                    },
                );
                Ok(Claim::Claimed)
            }
        }
    }

    async fn complete(&self, event_id: &str) -> Result<(), GatewayError> {
        let mut records = self.records.lock().await;
        records.insert(
            event_id.to_string(),
            Record {
                state: RecordState::Completed,
                touched_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn release(&self, event_id: &str) -> Result<(), GatewayError> {
        let mut records = self.records.lock().await;
        if matches!(
            records.get(event_id).map(|record| record.state),
            Some(RecordState::InFlight)
        ) {
            records.remove(event_id);
        }
        Ok(())
    }
}
