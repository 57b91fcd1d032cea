//! Shared kernel: identifiers, validated values and the error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::event_bus::{Disposition, PublishError};
use crate::registration::ForwardError;

/// Opaque verification token.
///
/// Generated by the saga at intake time, never derived from message content
/// and never supplied by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(Uuid);

impl VerificationId {
    /// Generate a fresh random token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VerificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for VerificationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A syntactically valid email address.
///
/// Validation is local (no DNS lookups): exactly one `@`, non-empty local
/// part, a domain with at least one dot, no whitespace, and the RFC 5321
/// total length cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value.is_empty() || value.len() > 320 {
            return Err(DomainError::InvalidEmail {
                value: raw.to_string(),
            });
        }
        if value.chars().any(|c| c.is_whitespace()) {
            return Err(DomainError::InvalidEmail {
                value: raw.to_string(),
            });
        }
        let mut parts = value.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = parts.next().unwrap_or("");
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(DomainError::InvalidEmail {
                value: raw.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque credential material forwarded to the authentication service.
///
/// Never logged: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the secret for transport. Call sites are the store bind and
    /// the downstream request body only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Error taxonomy for the verification saga.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A live record already exists for this email. Terminal: acknowledged
    /// without retry.
    #[error("duplicate registration for {email}")]
    DuplicateRegistration { email: EmailAddress },

    /// The intake message carried a syntactically invalid email. Terminal.
    #[error("invalid email address: {value:?}")]
    InvalidEmail { value: String },

    /// The verification mail could not be delivered; the pending record was
    /// rolled back. Retryable via broker redelivery.
    #[error("verification mail delivery failed: {reason}")]
    MailDeliveryFailed { reason: String },

    /// The verification token matches no live record: either already
    /// consumed (redelivery/replay) or never issued. Terminal no-op.
    #[error("unknown or already consumed verification token: {id}")]
    UnknownOrAlreadyConsumedToken { id: VerificationId },

    /// Forwarding the completed registration downstream failed; the delete
    /// was rolled back. Retryability depends on the failure class.
    #[error("downstream forward failed: {0}")]
    DownstreamForward(#[from] ForwardError),

    /// Publishing to the broker failed. Reported to the producer's caller.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    /// Store access failed. Retryable: the broker redelivers once the
    /// database is reachable again.
    #[error("verification store error: {message}")]
    Store { message: String },
}

impl DomainError {
    /// Map this error to a broker disposition per the propagation policy:
    /// terminal failures are acknowledged and logged, transient failures are
    /// surfaced only as "do not acknowledge" so the broker retries.
    pub fn disposition(&self) -> Disposition {
        match self {
            DomainError::DuplicateRegistration { .. }
            | DomainError::InvalidEmail { .. }
            | DomainError::UnknownOrAlreadyConsumedToken { .. } => Disposition::Ack,
            DomainError::MailDeliveryFailed { .. }
            | DomainError::Publish(_)
            | DomainError::Store { .. } => Disposition::Retry(None),
            DomainError::DownstreamForward(forward) => {
                if forward.is_terminal() {
                    Disposition::Ack
                } else {
                    Disposition::Retry(None)
                }
            }
        }
    }

    /// Convenience for log routing.
    pub fn is_terminal(&self) -> bool {
        matches!(self.disposition(), Disposition::Ack)
    }
}
