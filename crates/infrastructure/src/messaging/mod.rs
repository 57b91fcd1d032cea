pub mod consumer;
pub mod nats;
