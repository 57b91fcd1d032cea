//! Veriflow domain layer.
//!
//! Core types and ports for the registration verification saga:
//!
//! - `shared_kernel`: identifiers, validated email addresses, secret
//!   material, the error taxonomy and its broker disposition policy
//! - `verification`: the pending-verification record and its store port
//! - `mail`: outbound mail port and the verification email composer
//! - `registration`: the downstream forward port and its failure classes
//! - `event_bus`: publishing and consuming ports for the broker
//! - `circuit_breaker`: failure isolation for downstream calls

pub mod circuit_breaker;
pub mod event_bus;
pub mod mail;
pub mod registration;
pub mod shared_kernel;
pub mod verification;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use event_bus::{Disposition, EventPublisher, MessageHandler, PublishError};
pub use mail::{MailError, MailMessage, MailSender};
pub use registration::{ForwardError, RegistrationForwarder};
pub use shared_kernel::{Credential, DomainError, EmailAddress, VerificationId};
pub use verification::{
    IntakeMessage, StoreTransaction, VerificationRecord, VerificationStore, VerifyMessage,
};
