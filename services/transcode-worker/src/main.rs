//! Transcode worker entry point: one consumer-group pool per job topic
//! (`video`, `video-resolutions`, `image`, `audio`, `delete-file`), each
//! dispatching to its typed handler. Shared producers for the response and
//! dead-letter topics, and two background deletion loops, are wired once
//! and handed to every handler.

mod delete_file_handler;
mod delete_workers;
mod dlq;
mod job_handler;
mod kinds;
mod response;

use bus_adapter::{ConsumerGroupConfig, Producer};
use delete_file_handler::DeleteFileHandler;
use delete_workers::DeleteWorkers;
use dlq::DlqEmitter;
use encoder_core::{Encoder, FfmpegEncoder};
use job_handler::TypedJobHandler;
use kinds::{audio::AudioKind, image::ImageKind, video::VideoKind, video_resolutions::VideoResolutionsKind};
use media_config::Config;
use media_types::{ArtifactLayout, DlqRecord, ResponseRecord};
use response::ResponseEmitter;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

fn worker_identity() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "transcode-worker".to_string())
}

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
    let dlq_producer = Producer::<DlqRecord>::new(config.kafka.brokers.as_str(), "failed-letter-queue")
        .expect("failed to create DLQ producer");

    let response = Arc::new(ResponseEmitter::new(response_producer));
    let dlq = Arc::new(DlqEmitter::new(dlq_producer, worker_identity()));
    let deletes = DeleteWorkers::spawn();
    let encoder: Arc<dyn Encoder> = Arc::new(FfmpegEncoder::default());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    macro_rules! spawn_pool {
        ($kind:ty, $topic:expr, $workers:expr) => {{
            let handler = Arc::new(TypedJobHandler::<$kind>::new(
                layout.clone(),
                encoder.clone(),
                deletes.clone(),
                dlq.clone(),
                response.clone(),
            ));
            let pool_config = ConsumerGroupConfig::new(
                config.kafka.brokers.as_str(),
                config.kafka.group_id($topic),
                $topic,
                $workers,
            );
            let shutdown_rx = shutdown_rx.clone();
            tasks.spawn(async move {
                bus_adapter::consumer::run_worker_pool(pool_config, handler, shutdown_rx).await
            });
        }};
    }

    spawn_pool!(VideoKind, "video", config.kafka.video_workers);
    spawn_pool!(
        VideoResolutionsKind,
        "video-resolutions",
        config.kafka.video_resolutions_workers
    );
    spawn_pool!(ImageKind, "image", config.kafka.image_workers);
    spawn_pool!(AudioKind, "audio", config.kafka.audio_workers);

    let delete_handler = Arc::new(DeleteFileHandler::new(layout.clone()));
    let delete_config = ConsumerGroupConfig::new(
        config.kafka.brokers.as_str(),
        config.kafka.group_id("delete-file"),
        "delete-file",
        config.kafka.delete_file_workers,
    );
    let delete_shutdown = shutdown_rx.clone();
    tasks.spawn(async move {
        bus_adapter::consumer::run_worker_pool(delete_config, delete_handler, delete_shutdown).await
    });

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => tracing::info!("consumer pool drained"),
            Ok(Err(err)) => tracing::error!(error = %err, "consumer pool exited with error"),
            Err(err) => tracing::error!(error = %err, "consumer pool task panicked"),
        }
    }

    tracing::info!("transcode-worker shutting down");
}
