//! Broker message handlers for the two saga topics.
//!
//! Each handler deserializes its wire message, runs the matching saga path
//! and collapses the outcome into a broker [`Disposition`]. Malformed
//! payloads are acknowledged: redelivering bytes that cannot be parsed can
//! never succeed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use veriflow_domain::{Disposition, DomainError, IntakeMessage, MessageHandler, VerifyMessage};

use crate::saga::VerificationSaga;

fn dispose(outcome: Result<(), DomainError>, topic: &str) -> Disposition {
    match outcome {
        Ok(()) => Disposition::Ack,
        Err(err) if err.is_terminal() => {
            warn!(topic, error = %err, "message rejected terminally");
            Disposition::Ack
        }
        Err(err) => {
            error!(topic, error = %err, "handling failed, message will be redelivered");
            err.disposition()
        }
    }
}

/// Handler for the registration intake topic.
pub struct IntakeHandler {
    saga: Arc<VerificationSaga>,
}

impl IntakeHandler {
    pub fn new(saga: Arc<VerificationSaga>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl MessageHandler for IntakeHandler {
    async fn handle(&self, payload: &[u8]) -> Disposition {
        let msg: IntakeMessage = match serde_json::from_slice(payload) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(error = %err, "discarding malformed intake payload");
                return Disposition::Ack;
            }
        };
        dispose(self.saga.on_intake(msg).await.map(|_| ()), "intake")
    }
}

/// Handler for the verification topic.
pub struct VerifyHandler {
    saga: Arc<VerificationSaga>,
}

impl VerifyHandler {
    pub fn new(saga: Arc<VerificationSaga>) -> Self {
        Self { saga }
    }
}

#[async_trait]
impl MessageHandler for VerifyHandler {
    async fn handle(&self, payload: &[u8]) -> Disposition {
        let msg: VerifyMessage = match serde_json::from_slice(payload) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(error = %err, "discarding malformed verification payload");
                return Disposition::Ack;
            }
        };
        dispose(self.saga.on_verify(msg).await, "verify")
    }
}
