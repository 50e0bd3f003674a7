//! Kafka-backed bus adapter: a typed, circuit-breaker-protected `Producer<T>`
//! and a `run_worker_pool` consumer-group runner with manual offset commit.

pub mod consumer;
pub mod error;
pub mod metrics;
pub mod producer;

pub use consumer::{ConsumerGroupConfig, DeliveredRecord, RecordHandler};
pub use error::BusError;
pub use producer::Producer;
