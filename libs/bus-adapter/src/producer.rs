//! Typed topic producer with circuit-breaker protection, grounded on the
//! teacher's `MediaEventsProducer` (kafka/events.rs): idempotent producer
//! settings, a Kafka-tuned circuit breaker wrapping the actual send.

use crate::error::BusError;
use crate::metrics::ProducerMetrics;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use resilience::{presets, CircuitBreaker, CircuitBreakerError, CircuitState};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Producer<T> {
    inner: Arc<FutureProducer>,
    topic: String,
    circuit_breaker: Arc<CircuitBreaker>,
    _marker: PhantomData<T>,
}

impl<T> Producer<T>
where
    T: Serialize,
{
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, BusError> {
        let inner: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("message.timeout.ms", "10000")
            .set("retries", "10")
            .set("retry.backoff.ms", "100")
            .create()?;

        let cb_config = presets::kafka_config().circuit_breaker;

        Ok(Self {
            inner: Arc::new(inner),
            topic: topic.into(),
            circuit_breaker: Arc::new(CircuitBreaker::new(cb_config)),
            _marker: PhantomData,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Publishes `value`. Messages are unkeyed: partition assignment is left
    /// to the broker's default balancer rather than pinned by job id.
    pub async fn publish(&self, value: &T) -> Result<(), BusError> {
        let payload = serde_json::to_vec(value)?;
        let topic = self.topic.clone();
        let producer = self.inner.clone();

        let result = self
            .circuit_breaker
            .call(|| async move {
                let record: FutureRecord<(), Vec<u8>> = FutureRecord::to(&topic).payload(&payload);
                producer
                    .send(record, Duration::from_secs(10))
                    .await
                    .map(|_| ())
                    .map_err(|(err, _)| err.to_string())
            })
            .await;

        match result {
            Ok(()) => {
                ProducerMetrics::record(&self.topic, "success");
                Ok(())
            }
            Err(CircuitBreakerError::Open) => {
                ProducerMetrics::record(&self.topic, "circuit_open");
                Err(BusError::CircuitOpen(self.topic.clone()))
            }
            Err(CircuitBreakerError::CallFailed(msg)) => {
                ProducerMetrics::record(&self.topic, "failed");
                Err(BusError::Produce(msg))
            }
        }
    }
}
