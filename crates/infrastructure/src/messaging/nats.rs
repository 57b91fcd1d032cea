//! NATS JetStream connection, stream provisioning and the publisher
//! adapter.

use std::time::Duration;

use async_nats::jetstream::stream::{Config as StreamConfig, RetentionPolicy};
use async_nats::jetstream::Context as JetStreamContext;
use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use veriflow_domain::{EventPublisher, PublishError};
use veriflow_shared::{NatsConfig, TopicsConfig};

/// Errors establishing the messaging topology.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("failed to connect to NATS at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to provision stream {stream}: {reason}")]
    Stream { stream: String, reason: String },

    #[error("failed to set up consumer {consumer}: {reason}")]
    Consumer { consumer: String, reason: String },
}

/// Connect to NATS and open a JetStream context.
pub async fn connect(config: &NatsConfig) -> Result<(Client, JetStreamContext), MessagingError> {
    let mut options =
        ConnectOptions::new().connection_timeout(Duration::from_secs(config.connect_timeout_secs));
    if let Some(name) = &config.name {
        options = options.name(name);
    }

    let client = options
        .connect(&config.url)
        .await
        .map_err(|e| MessagingError::Connect {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
    info!(url = %config.url, "connected to NATS");

    let jetstream = async_nats::jetstream::new(client.clone());
    Ok((client, jetstream))
}

/// Ensure the work-queue streams backing both saga subjects exist.
///
/// Work-queue retention deletes a message once its consumer acknowledged
/// it, which is exactly the at-least-once contract the saga relies on.
pub async fn provision_streams(
    jetstream: &JetStreamContext,
    topics: &TopicsConfig,
) -> Result<(), MessagingError> {
    ensure_stream(jetstream, &topics.intake_stream, &topics.intake_subject).await?;
    ensure_stream(jetstream, &topics.verify_stream, &topics.verify_subject).await?;
    Ok(())
}

async fn ensure_stream(
    jetstream: &JetStreamContext,
    name: &str,
    subject: &str,
) -> Result<(), MessagingError> {
    if jetstream.get_stream(name).await.is_ok() {
        debug!(stream = name, "stream already exists");
        return Ok(());
    }

    jetstream
        .create_stream(StreamConfig {
            name: name.to_string(),
            subjects: vec![subject.to_string()],
            retention: RetentionPolicy::WorkQueue,
            ..Default::default()
        })
        .await
        .map_err(|e| MessagingError::Stream {
            stream: name.to_string(),
            reason: e.to_string(),
        })?;

    info!(stream = name, subject, "created stream");
    Ok(())
}

/// JetStream-backed publisher.
///
/// Publish waits for the broker acknowledgment, so an `Ok` means the
/// message is persisted in its stream.
#[derive(Clone)]
pub struct NatsEventPublisher {
    jetstream: JetStreamContext,
}

impl NatsEventPublisher {
    pub fn new(jetstream: JetStreamContext) -> Self {
        Self { jetstream }
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let ack = self
            .jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Broker {
                subject: subject.to_string(),
                reason: e.to_string(),
            })?;

        ack.await.map_err(|e| PublishError::Broker {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;

        debug!(subject, "message persisted in stream");
        Ok(())
    }
}
