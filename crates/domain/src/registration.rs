//! Downstream registration forward port.

use async_trait::async_trait;
use thiserror::Error;

use crate::shared_kernel::{Credential, EmailAddress};

/// Failure classes for a downstream forward attempt.
///
/// Classification drives the saga's retry behavior: a rejection is terminal
/// (the authentication service made a decision, retrying cannot change it),
/// everything else is retryable via broker redelivery.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Client-range response (4xx), e.g. a duplicate account. Terminal.
    #[error("authentication service rejected the registration (status {status})")]
    Rejected { status: u16 },

    /// Server-range response (5xx) or a transport failure. Retryable.
    #[error("authentication service unavailable: {reason}")]
    Unavailable { reason: String },

    /// The call exceeded its timeout. Retryable.
    #[error("authentication service call timed out")]
    Timeout,

    /// The circuit breaker is open; no network call was attempted. Retryable
    /// once the cooldown elapses.
    #[error("circuit breaker open, forward not attempted")]
    CircuitOpen,
}

impl ForwardError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ForwardError::Rejected { .. })
    }
}

/// Resilient client port wrapping the authentication service call.
///
/// The implementation carries timeout and circuit breaking; it never loops.
/// The saga's retry, via broker redelivery, is the sole retry mechanism.
#[async_trait]
pub trait RegistrationForwarder: Send + Sync {
    async fn forward(
        &self,
        email: &EmailAddress,
        credential: &Credential,
    ) -> Result<(), ForwardError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejections_are_terminal() {
        assert!(ForwardError::Rejected { status: 409 }.is_terminal());
        assert!(!ForwardError::Unavailable {
            reason: "status 500".into()
        }
        .is_terminal());
        assert!(!ForwardError::Timeout.is_terminal());
        assert!(!ForwardError::CircuitOpen.is_terminal());
    }
}
