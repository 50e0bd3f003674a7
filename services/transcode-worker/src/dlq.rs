//! Builds and publishes `DlqRecord`s to `failed-letter-queue` on behalf of
//! every primary job handler.

use bus_adapter::{DeliveredRecord, Producer};
use chrono::Utc;
use media_types::DlqRecord;

pub struct DlqEmitter {
    producer: Producer<DlqRecord>,
    worker_id: String,
}

impl DlqEmitter {
    pub fn new(producer: Producer<DlqRecord>, worker_id: impl Into<String>) -> Self {
        Self {
            producer,
            worker_id: worker_id.into(),
        }
    }

    /// Publishes the DLQ record for a failed record and returns whether the
    /// publish itself succeeded, so the caller can decide how to report the
    /// job's outcome.
    pub async fn publish(
        &self,
        original_topic: &str,
        record: &DeliveredRecord<'_>,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<DlqRecord, bus_adapter::BusError> {
        let dlq_record = DlqRecord {
            original_topic: original_topic.to_string(),
            partition: record.partition,
            offset: record.offset,
            high_watermark: record.high_watermark,
            raw_value: record.payload.to_vec(),
            error: error.into(),
            processed_at: Utc::now(),
            errored_at: Utc::now(),
            worker_id: self.worker_id.clone(),
            message: message.into(),
        };

        self.producer.publish(&dlq_record).await?;
        Ok(dlq_record)
    }
}
