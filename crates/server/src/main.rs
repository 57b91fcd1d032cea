//! Veriflow consumer service.
//!
//! Wires the saga together: PostgreSQL store, mail gateway, circuit-broken
//! downstream client, and one durable consumer loop per saga subject. All
//! configuration is loaded once at startup and handed to constructors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use veriflow_application::{IntakeHandler, VerificationSaga, VerifyHandler};
use veriflow_infrastructure::messaging::nats;
use veriflow_infrastructure::{
    DatabasePool, HttpMailGateway, HttpRegistrationForwarder, PostgresVerificationStore,
    SagaConsumer, SagaConsumerConfig,
};
use veriflow_shared::{ConfigLoader, ServiceConfig, TopicsConfig};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn consumer_config(topics: &TopicsConfig, subject: &str, stream: &str, durable: &str) -> SagaConsumerConfig {
    SagaConsumerConfig {
        stream: stream.to_string(),
        subject: subject.to_string(),
        durable_name: durable.to_string(),
        nak_delay: topics.nak_delay(),
        drain_timeout: topics.drain_timeout(),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: ServiceConfig = ConfigLoader::new(Some(PathBuf::from(".env")))
        .load()
        .context("loading configuration")?;
    init_tracing(&config.logging.level);
    info!("starting veriflow server");

    let pool = DatabasePool::connect(&config.database)
        .await
        .context("connecting to PostgreSQL")?;
    let store = PostgresVerificationStore::new(pool.pg_pool());
    store.init_schema().await.context("initializing schema")?;

    let (_client, jetstream) = nats::connect(&config.nats)
        .await
        .context("connecting to NATS")?;
    nats::provision_streams(&jetstream, &config.topics)
        .await
        .context("provisioning streams")?;

    let mailer = HttpMailGateway::new(&config.mail).context("building mail gateway client")?;
    let forwarder =
        HttpRegistrationForwarder::new(&config.downstream).context("building downstream client")?;

    let saga = Arc::new(VerificationSaga::new(
        Arc::new(store),
        Arc::new(mailer),
        Arc::new(forwarder),
        config.mail.verify_link_base.clone(),
    ));

    let topics = &config.topics;
    let intake_consumer = SagaConsumer::new(
        jetstream.clone(),
        Arc::new(IntakeHandler::new(Arc::clone(&saga))),
        consumer_config(
            topics,
            &topics.intake_subject,
            &topics.intake_stream,
            &topics.intake_durable,
        ),
    );
    let verify_consumer = SagaConsumer::new(
        jetstream,
        Arc::new(VerifyHandler::new(saga)),
        consumer_config(
            topics,
            &topics.verify_subject,
            &topics.verify_stream,
            &topics.verify_durable,
        ),
    );

    let (shutdown_tx, _) = broadcast::channel(1);

    let intake_task = {
        let rx = shutdown_tx.subscribe();
        tokio::spawn(async move { intake_consumer.start(rx).await })
    };
    let verify_task = {
        let rx = shutdown_tx.subscribe();
        tokio::spawn(async move { verify_consumer.start(rx).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    let drain = config.topics.drain_timeout() + Duration::from_secs(5);
    let joined = tokio::time::timeout(drain, async {
        let (intake, verify) = tokio::join!(intake_task, verify_task);
        for result in [intake, verify] {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "consumer loop failed"),
                Err(e) => error!(error = %e, "consumer task panicked"),
            }
        }
    })
    .await;
    if joined.is_err() {
        error!("consumer loops did not stop within the drain window");
    }

    info!("veriflow server stopped");
    Ok(())
}
