//! Producer service feeding the saga topics.
//!
//! The producer sits in front of the broker on behalf of whatever edge
//! accepts registrations and verification clicks. It validates what can be
//! validated cheaply, serializes the wire message and hands it to the
//! publisher port; delivery guarantees past that point belong to the broker.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use veriflow_domain::{
    DomainError, EmailAddress, EventPublisher, IntakeMessage, PublishError, VerifyMessage,
};

/// Publishes intake and verification messages to their subjects.
#[derive(Clone)]
pub struct RegistrationProducer {
    publisher: Arc<dyn EventPublisher>,
    intake_subject: String,
    verify_subject: String,
}

impl RegistrationProducer {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        intake_subject: impl Into<String>,
        verify_subject: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            intake_subject: intake_subject.into(),
            verify_subject: verify_subject.into(),
        }
    }

    /// Publish a registration intake message.
    ///
    /// The email is validated before publishing so an obviously bad
    /// registration is rejected at the edge instead of bouncing through the
    /// consumer as a terminal failure.
    pub async fn publish_registration(
        &self,
        email: &str,
        password: impl Into<String>,
    ) -> Result<(), DomainError> {
        let email = EmailAddress::parse(email)?;
        let msg = IntakeMessage {
            email: email.as_str().to_string(),
            password: password.into(),
        };
        let payload = serde_json::to_vec(&msg)
            .map_err(|err| PublishError::Serialize(err.to_string()))?;

        self.publisher.publish(&self.intake_subject, payload).await?;
        info!(subject = %self.intake_subject, email = %email, "registration intake published");
        Ok(())
    }

    /// Publish a verification message carrying the clicked token.
    pub async fn publish_verification(&self, ver_id: Uuid) -> Result<(), DomainError> {
        let msg = VerifyMessage { ver_id };
        let payload = serde_json::to_vec(&msg)
            .map_err(|err| PublishError::Serialize(err.to_string()))?;

        self.publisher.publish(&self.verify_subject, payload).await?;
        info!(subject = %self.verify_subject, %ver_id, "verification published");
        Ok(())
    }
}
