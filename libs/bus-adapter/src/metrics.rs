/// Prometheus metrics for the producer and consumer-group worker pool.
#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use prometheus::{register_int_counter_vec, IntCounterVec};

#[cfg(feature = "metrics")]
static MESSAGES_PRODUCED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bus_messages_produced_total",
        "Total number of messages produced, by topic and outcome",
        &["topic", "result"]
    )
    .expect("Failed to register bus messages produced metric")
});

#[cfg(feature = "metrics")]
static MESSAGES_CONSUMED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bus_messages_consumed_total",
        "Total number of messages consumed, by topic and outcome",
        &["topic", "result"]
    )
    .expect("Failed to register bus messages consumed metric")
});

#[cfg(feature = "metrics")]
static COMMIT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bus_commit_failures_total",
        "Total number of offset commit failures, by topic",
        &["topic"]
    )
    .expect("Failed to register bus commit failures metric")
});

#[cfg(feature = "metrics")]
pub struct ProducerMetrics;

#[cfg(feature = "metrics")]
impl ProducerMetrics {
    pub fn record(topic: &str, result: &str) {
        MESSAGES_PRODUCED.with_label_values(&[topic, result]).inc();
    }
}

#[cfg(feature = "metrics")]
pub struct ConsumerMetrics;

#[cfg(feature = "metrics")]
impl ConsumerMetrics {
    pub fn record_consumed(topic: &str, result: &str) {
        MESSAGES_CONSUMED.with_label_values(&[topic, result]).inc();
    }

    pub fn record_commit_failure(topic: &str) {
        COMMIT_FAILURES.with_label_values(&[topic]).inc();
    }
}

#[cfg(not(feature = "metrics"))]
pub struct ProducerMetrics;

#[cfg(not(feature = "metrics"))]
impl ProducerMetrics {
    pub fn record(_topic: &str, _result: &str) {}
}

#[cfg(not(feature = "metrics"))]
pub struct ConsumerMetrics;

#[cfg(not(feature = "metrics"))]
impl ConsumerMetrics {
    pub fn record_consumed(_topic: &str, _result: &str) {}
    pub fn record_commit_failure(_topic: &str) {}
}
