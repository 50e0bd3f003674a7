//! Retry worker entry point: one consumer-group pool against
//! `failed-letter-queue`, each worker running the bounded re-execution loop
//! before emitting a terminal response.

mod delete_workers;
mod dispatch;
mod handler;
mod response;

use bus_adapter::{ConsumerGroupConfig, Producer};
use delete_workers::DeleteWorkers;
use encoder_core::{Encoder, FfmpegEncoder};
use handler::RetryHandler;
use media_config::Config;
use media_types::{ArtifactLayout, ResponseRecord};
use response::ResponseEmitter;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("failed to load configuration");
    let layout = ArtifactLayout::new(
        config.storage.staging_root.clone(),
        config.storage.artifact_root.clone(),
    );

    let response_producer =
        Producer::<ResponseRecord>::new(config.kafka.brokers.as_str(), "media-docker-files-response")
            .expect("failed to create response producer");

    let response = Arc::new(ResponseEmitter::new(response_producer));
    let deletes = DeleteWorkers::spawn();
    let encoder: Arc<dyn Encoder> = Arc::new(FfmpegEncoder::default());

    let handler = Arc::new(RetryHandler::new(layout, encoder, deletes, response));

    let pool_config = ConsumerGroupConfig::new(
        config.kafka.brokers.as_str(),
        config.kafka.group_id("failed-letter-queue"),
        "failed-letter-queue",
        config.kafka.failed_workers,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    if let Err(err) = bus_adapter::consumer::run_worker_pool(pool_config, handler, shutdown_rx).await {
        tracing::error!(error = %err, "retry-worker consumer pool exited with error");
    }

    tracing::info!("retry-worker shutting down");
}
