//! Veriflow application layer.
//!
//! Orchestrates the verification saga over the domain ports and exposes the
//! producer service that feeds the saga through the broker.

pub mod handlers;
pub mod producer;
pub mod saga;

pub use handlers::{IntakeHandler, VerifyHandler};
pub use producer::RegistrationProducer;
pub use saga::VerificationSaga;
