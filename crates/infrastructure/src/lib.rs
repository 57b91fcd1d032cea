//! Veriflow infrastructure adapters.
//!
//! Concrete implementations of the domain ports:
//!
//! - `persistence`: PostgreSQL verification store with open-transaction
//!   handoff
//! - `messaging`: NATS JetStream publisher, stream provisioning and the
//!   durable consumer loop
//! - `mail`: HTTP mail gateway client
//! - `downstream`: circuit-broken HTTP client for the authentication
//!   service

pub mod downstream;
pub mod mail;
pub mod messaging;
pub mod persistence;

pub use downstream::HttpRegistrationForwarder;
pub use mail::HttpMailGateway;
pub use messaging::consumer::{SagaConsumer, SagaConsumerConfig};
pub use messaging::nats::NatsEventPublisher;
pub use persistence::postgres::pool::DatabasePool;
pub use persistence::postgres::verification_store::PostgresVerificationStore;
