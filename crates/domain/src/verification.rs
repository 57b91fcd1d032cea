//! The pending-verification record and its store port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared_kernel::{Credential, DomainError, EmailAddress, VerificationId};

/// A pending verification.
///
/// Write-once, delete-once: a record exists exactly while its verification
/// mail has been sent and not yet confirmed. There is no update operation.
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    id: VerificationId,
    email: EmailAddress,
    credential: Credential,
}

impl VerificationRecord {
    /// Create a record with a freshly generated token.
    pub fn new(email: EmailAddress, credential: Credential) -> Self {
        Self {
            id: VerificationId::new(),
            email,
            credential,
        }
    }

    /// Rebuild a record from stored parts.
    pub fn from_parts(id: VerificationId, email: EmailAddress, credential: Credential) -> Self {
        Self {
            id,
            email,
            credential,
        }
    }

    pub fn id(&self) -> VerificationId {
        self.id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Wire message on the registration intake topic.
///
/// The email is kept raw here; validation happens when the saga consumes
/// the message, so a malformed payload can be rejected terminally instead
/// of poisoning deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeMessage {
    pub email: String,
    pub password: String,
}

/// Wire message on the verification topic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyMessage {
    pub ver_id: Uuid,
}

/// An open store transaction covering one saga step.
///
/// Commit consumes the transaction and finalizes the pending write or
/// delete. Explicit rollback (or dropping the transaction unconsumed)
/// undoes it. Commit is the only path that makes effects durable.
#[async_trait]
pub trait StoreTransaction: Send + std::fmt::Debug {
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Store port for pending verifications.
///
/// Both operations return with the transaction still open so the caller can
/// interleave an external side effect between the write and the commit.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Insert a pending record inside a new transaction.
    ///
    /// A unique-constraint violation on the email is reported as
    /// [`DomainError::DuplicateRegistration`].
    async fn insert_pending(
        &self,
        record: &VerificationRecord,
    ) -> Result<Box<dyn StoreTransaction>, DomainError>;

    /// Delete the record for `id` inside a new transaction, returning it.
    ///
    /// Zero rows affected is reported as
    /// [`DomainError::UnknownOrAlreadyConsumedToken`]. Under concurrent
    /// deliveries of the same token the row lock serializes the deletes, so
    /// exactly one caller observes the record.
    async fn take_pending(
        &self,
        id: VerificationId,
    ) -> Result<(VerificationRecord, Box<dyn StoreTransaction>), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_new_generates_a_token() {
        let email = EmailAddress::parse("alice@example.com").unwrap();
        let a = VerificationRecord::new(email.clone(), Credential::new("h1"));
        let b = VerificationRecord::new(email, Credential::new("h1"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn intake_message_round_trips_wire_names() {
        let msg: IntakeMessage =
            serde_json::from_str(r#"{"email":"a@b.co","password":"x"}"#).unwrap();
        assert_eq!(msg.email, "a@b.co");
        let encoded = serde_json::to_string(&msg).unwrap();
        assert!(encoded.contains("\"password\""));
    }

    #[test]
    fn verify_message_uses_ver_id_field() {
        let id = Uuid::new_v4();
        let encoded = serde_json::to_string(&VerifyMessage { ver_id: id }).unwrap();
        assert!(encoded.contains("ver_id"));
        let decoded: VerifyMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.ver_id, id);
    }

    #[test]
    fn record_debug_does_not_leak_credentials() {
        let email = EmailAddress::parse("alice@example.com").unwrap();
        let record = VerificationRecord::new(email, Credential::new("super-secret"));
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
