//! Durable pull consumer loop for a saga subject.
//!
//! One `SagaConsumer` drives one durable JetStream consumer and feeds every
//! message to a [`MessageHandler`]. The handler's [`Disposition`] is the
//! only signal back to the broker:
//!
//! - `Ack` acknowledges and the work-queue stream deletes the message
//! - `Retry` sends a negative acknowledgment with a delay, so the broker
//!   redelivers later
//!
//! `max_ack_pending` is 1: messages on a subject are processed strictly one
//! at a time, so a redelivery can never race its original delivery within
//! the same consumer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_nats::jetstream::consumer::pull::Config as PullConsumerConfig;
use async_nats::jetstream::consumer::{AckPolicy, PullConsumer};
use async_nats::jetstream::AckKind;
use async_nats::jetstream::Context as JetStreamContext;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use veriflow_domain::{Disposition, MessageHandler};

use super::nats::MessagingError;

/// Settings for one consumer loop.
#[derive(Debug, Clone)]
pub struct SagaConsumerConfig {
    /// Stream the durable consumer is created on
    pub stream: String,

    /// Subject filter within the stream
    pub subject: String,

    /// Durable consumer name
    pub durable_name: String,

    /// How long the broker waits for an ack before redelivering
    pub ack_wait: Duration,

    /// Redelivery delay applied when a handler requests a retry without
    /// its own delay
    pub nak_delay: Duration,

    /// How long in-flight work may finish after a shutdown signal
    pub drain_timeout: Duration,
}

impl Default for SagaConsumerConfig {
    fn default() -> Self {
        Self {
            stream: String::new(),
            subject: String::new(),
            durable_name: String::new(),
            ack_wait: Duration::from_secs(30),
            nak_delay: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Consumer loop binding a durable JetStream consumer to a handler.
pub struct SagaConsumer {
    jetstream: JetStreamContext,
    handler: Arc<dyn MessageHandler>,
    config: SagaConsumerConfig,
}

impl SagaConsumer {
    pub fn new(
        jetstream: JetStreamContext,
        handler: Arc<dyn MessageHandler>,
        config: SagaConsumerConfig,
    ) -> Self {
        Self {
            jetstream,
            handler,
            config,
        }
    }

    /// Run the loop until `shutdown_rx` fires, then drain.
    ///
    /// After the shutdown signal the loop keeps handling already-delivered
    /// messages until the drain deadline, then stops. Unacknowledged
    /// messages are redelivered by the broker after `ack_wait`.
    pub async fn start(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), MessagingError> {
        let consumer = self.ensure_consumer().await?;
        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| MessagingError::Consumer {
                consumer: self.config.durable_name.clone(),
                reason: e.to_string(),
            })?;

        info!(
            consumer = %self.config.durable_name,
            stream = %self.config.stream,
            subject = %self.config.subject,
            "consumer loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(consumer = %self.config.durable_name, "shutdown signal received, draining");
                    break;
                }
                next = messages.next() => {
                    match next {
                        Some(Ok(message)) => self.dispatch(message).await,
                        Some(Err(e)) => {
                            error!(consumer = %self.config.durable_name, error = %e, "message receive error");
                        }
                        None => {
                            warn!(consumer = %self.config.durable_name, "message stream closed");
                            return Ok(());
                        }
                    }
                }
            }
        }

        // Drain phase: finish whatever the broker already pushed our way.
        let deadline = Instant::now() + self.config.drain_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(consumer = %self.config.durable_name, "drain deadline reached");
                break;
            }
            match tokio::time::timeout(remaining, messages.next()).await {
                Ok(Some(Ok(message))) => self.dispatch(message).await,
                Ok(Some(Err(e))) => {
                    error!(consumer = %self.config.durable_name, error = %e, "receive error during drain");
                }
                Ok(None) | Err(_) => break,
            }
        }

        info!(consumer = %self.config.durable_name, "consumer loop stopped");
        Ok(())
    }

    async fn dispatch(&self, message: async_nats::jetstream::Message) {
        let disposition = self.handler.handle(&message.payload).await;
        match disposition {
            Disposition::Ack => {
                if let Err(e) = message.ack().await {
                    error!(consumer = %self.config.durable_name, error = %e, "failed to ack message");
                }
            }
            Disposition::Retry(delay) => {
                let delay = delay.unwrap_or(self.config.nak_delay);
                debug!(
                    consumer = %self.config.durable_name,
                    delay_secs = delay.as_secs(),
                    "negative ack, broker will redeliver"
                );
                if let Err(e) = message.ack_with(AckKind::Nak(Some(delay))).await {
                    error!(consumer = %self.config.durable_name, error = %e, "failed to nak message");
                }
            }
        }
    }

    async fn ensure_consumer(&self) -> Result<PullConsumer, MessagingError> {
        let stream = self
            .jetstream
            .get_stream(&self.config.stream)
            .await
            .map_err(|e| MessagingError::Stream {
                stream: self.config.stream.clone(),
                reason: e.to_string(),
            })?;

        if let Ok(consumer) = stream.get_consumer(&self.config.durable_name).await {
            debug!(consumer = %self.config.durable_name, "durable consumer already exists");
            return Ok(consumer);
        }

        let consumer = stream
            .create_consumer(PullConsumerConfig {
                durable_name: Some(self.config.durable_name.clone()),
                filter_subject: self.config.subject.clone(),
                ack_policy: AckPolicy::Explicit,
                ack_wait: self.config.ack_wait,
                max_ack_pending: 1,
                ..Default::default()
            })
            .await
            .map_err(|e| MessagingError::Consumer {
                consumer: self.config.durable_name.clone(),
                reason: e.to_string(),
            })?;

        info!(consumer = %self.config.durable_name, "created durable consumer");
        Ok(consumer)
    }
}
