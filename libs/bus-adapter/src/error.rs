#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error("kafka client error: {0}")]
    Client(#[from] rdkafka::error::KafkaError),
    #[error("producer circuit breaker open for topic {0}")]
    CircuitOpen(String),
    #[error("produce failed: {0}")]
    Produce(String),
    #[error("payload encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
