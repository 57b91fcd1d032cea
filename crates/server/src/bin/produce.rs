//! Operational producer binary.
//!
//! Publishes a single message to either saga subject, for smoke testing a
//! deployment or replaying a lost verification:
//!
//! ```text
//! veriflow-produce register <email> <password-hash>
//! veriflow-produce verify <ver-id>
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use veriflow_application::RegistrationProducer;
use veriflow_infrastructure::messaging::nats;
use veriflow_infrastructure::NatsEventPublisher;
use veriflow_shared::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = ConfigLoader::new(Some(PathBuf::from(".env")))
        .load()
        .context("loading configuration")?;
    let (_client, jetstream) = nats::connect(&config.nats)
        .await
        .context("connecting to NATS")?;
    nats::provision_streams(&jetstream, &config.topics)
        .await
        .context("provisioning streams")?;

    let producer = RegistrationProducer::new(
        Arc::new(NatsEventPublisher::new(jetstream)),
        config.topics.intake_subject.clone(),
        config.topics.verify_subject.clone(),
    );

    match args.as_slice() {
        [cmd, email, password] if cmd == "register" => {
            producer
                .publish_registration(email, password.clone())
                .await
                .context("publishing registration")?;
            println!("registration published for {email}");
        }
        [cmd, ver_id] if cmd == "verify" => {
            let ver_id: Uuid = ver_id.parse().context("parsing verification id")?;
            producer
                .publish_verification(ver_id)
                .await
                .context("publishing verification")?;
            println!("verification published for {ver_id}");
        }
        _ => bail!("usage: veriflow-produce register <email> <password-hash> | verify <ver-id>"),
    }

    Ok(())
}
