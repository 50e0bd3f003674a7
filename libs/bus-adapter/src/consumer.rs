//! Consumer-group worker pool: `worker_count` independent `StreamConsumer`s
//! share one `group.id` against one topic, so Kafka spreads partitions
//! across them. Each worker drains a `tokio::select!` between a shutdown
//! watch channel and the message stream, committing an offset only once
//! its record is fully processed.

use crate::error::BusError;
use crate::metrics::ConsumerMetrics;
use futures_util::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Consecutive fetch-error budget before a worker gives up and exits.
const MAX_FETCH_ERROR_RETRIES: u32 = 5;
const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(4);

#[derive(Clone, Debug)]
pub struct ConsumerGroupConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
    pub worker_count: u32,
    pub session_timeout_ms: u32,
    pub max_poll_interval_ms: u32,
    pub heartbeat_interval_ms: u32,
    pub socket_connection_setup_timeout_ms: u32,
}

impl ConsumerGroupConfig {
    pub fn new(brokers: impl Into<String>, group_id: impl Into<String>, topic: impl Into<String>, worker_count: u32) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: group_id.into(),
            topic: topic.into(),
            worker_count: worker_count.max(1),
            session_timeout_ms: 45_000,
            max_poll_interval_ms: 300_000,
            heartbeat_interval_ms: 3_000,
            socket_connection_setup_timeout_ms: 10_000,
        }
    }
}

/// A single consumed record, handed to the caller's handler before the
/// offset is committed. `partition`/`offset`/`raw_payload` are carried so a
/// failing handler can build a `DlqRecord` without re-reading the broker.
pub struct DeliveredRecord<'a> {
    pub partition: i32,
    pub offset: i64,
    pub high_watermark: i64,
    pub payload: &'a [u8],
}

#[async_trait::async_trait]
pub trait RecordHandler: Send + Sync + 'static {
    /// Handles one record. `Err` means the record is routed to the DLQ by
    /// the caller of `run_worker_pool`; the offset is still committed
    /// either way, since a DLQ publish is itself the terminal handling of
    /// that record.
    async fn handle(&self, record: DeliveredRecord<'_>) -> Result<(), String>;
}

/// Runs `config.worker_count` consumer tasks until `shutdown_rx` reports
/// `true`. Returns once every worker task has stopped.
pub async fn run_worker_pool(
    config: ConsumerGroupConfig,
    handler: Arc<dyn RecordHandler>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), BusError> {
    let mut tasks = JoinSet::new();
    let active_workers = Arc::new(AtomicU32::new(config.worker_count));

    for worker_index in 0..config.worker_count {
        let config = config.clone();
        let handler = handler.clone();
        let shutdown_rx = shutdown_rx.clone();
        let active_workers = active_workers.clone();
        tasks.spawn(async move {
            if let Err(err) = run_one_worker(config, handler, shutdown_rx, worker_index, active_workers).await {
                tracing::error!(worker_index, error = %err, "consumer worker exited with error");
            }
        });
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}

async fn run_one_worker(
    config: ConsumerGroupConfig,
    handler: Arc<dyn RecordHandler>,
    mut shutdown_rx: watch::Receiver<bool>,
    worker_index: u32,
    active_workers: Arc<AtomicU32>,
) -> Result<(), BusError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set("session.timeout.ms", config.session_timeout_ms.to_string())
        .set("max.poll.interval.ms", config.max_poll_interval_ms.to_string())
        .set("heartbeat.interval.ms", config.heartbeat_interval_ms.to_string())
        .set(
            "socket.connection.setup.timeout.ms",
            config.socket_connection_setup_timeout_ms.to_string(),
        )
        .create()?;

    consumer.subscribe(&[config.topic.as_str()])?;

    tracing::info!(
        topic = %config.topic,
        group_id = %config.group_id,
        worker_index,
        "consumer worker started"
    );

    let mut stream = consumer.stream();
    let mut consecutive_fetch_errors = 0u32;
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(msg)) => {
                        consecutive_fetch_errors = 0;
                        let payload = msg.payload().unwrap_or_default();
                        let high_watermark = consumer
                            .fetch_watermarks(msg.topic(), msg.partition(), std::time::Duration::from_secs(5))
                            .map(|(_, high)| high)
                            .unwrap_or(-1);
                        let delivered = DeliveredRecord {
                            partition: msg.partition(),
                            offset: msg.offset(),
                            high_watermark,
                            payload,
                        };
                        match handler.handle(delivered).await {
                            Ok(()) => ConsumerMetrics::record_consumed(&config.topic, "success"),
                            Err(err) => {
                                ConsumerMetrics::record_consumed(&config.topic, "failed");
                                tracing::warn!(
                                    partition = msg.partition(),
                                    offset = msg.offset(),
                                    error = %err,
                                    "record handling failed"
                                );
                            }
                        }
                        if let Err(err) = consumer.commit_message(&msg, CommitMode::Sync) {
                            ConsumerMetrics::record_commit_failure(&config.topic);
                            tracing::error!(error = %err, "failed to commit offset");
                        }
                    }
                    Some(Err(err)) => {
                        consecutive_fetch_errors += 1;
                        tracing::error!(
                            error = %err,
                            worker_index,
                            attempt = consecutive_fetch_errors,
                            "kafka consumer fetch error"
                        );
                        if consecutive_fetch_errors >= MAX_FETCH_ERROR_RETRIES {
                            tracing::error!(
                                worker_index,
                                topic = %config.topic,
                                "exhausted fetch-error retries, worker exiting"
                            );
                            break;
                        }
                        tokio::time::sleep(FETCH_ERROR_BACKOFF).await;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!(worker_index, topic = %config.topic, "consumer worker stopped");
    let remaining = active_workers.fetch_sub(1, Ordering::SeqCst) - 1;
    if remaining == 0 {
        tracing::info!(topic = %config.topic, "topic drained, no active workers remaining");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_clamped_to_at_least_one() {
        let cfg = ConsumerGroupConfig::new("localhost:9092", "g", "video", 0);
        assert_eq!(cfg.worker_count, 1);
    }
}
