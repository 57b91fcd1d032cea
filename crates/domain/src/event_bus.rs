//! Broker ports: publishing and message handling.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// What the consumer loop should tell the broker after handling a message.
///
/// `Ack` covers both success and terminal failures; `Retry` leaves the
/// message unacknowledged (negative ack) so the broker redelivers it. The
/// optional delay overrides the consumer's configured redelivery delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Retry(Option<Duration>),
}

/// Errors publishing a message to the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize payload: {0}")]
    Serialize(String),

    #[error("broker rejected publish to {subject}: {reason}")]
    Broker { subject: String, reason: String },
}

/// Synchronous hand-off to the broker.
///
/// A publish failure is reported to the caller and not retried here; retry
/// policy belongs to whoever accepted the original request.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// A consumer-side message handler.
///
/// Implementations own deserialization and logging; whatever happens, the
/// returned disposition is the only signal back to the broker.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Disposition;
}
