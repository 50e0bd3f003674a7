//! Response emitter: a thin wrapper over `Producer<ResponseRecord>` used by
//! every job handler to report a terminal `completed`/`failed` outcome.
//! Produce failures are logged and swallowed — the DLQ, not this channel,
//! is the durable record of a partial failure.

use bus_adapter::Producer;
use media_types::{JobId, MediaType, ResponseRecord};

pub struct ResponseEmitter {
    producer: Producer<ResponseRecord>,
}

impl ResponseEmitter {
    pub fn new(producer: Producer<ResponseRecord>) -> Self {
        Self { producer }
    }

    pub async fn completed(&self, id: JobId, file_type: MediaType) {
        self.emit(ResponseRecord::completed(id, file_type)).await;
    }

    pub async fn failed(&self, id: JobId, file_type: MediaType) {
        self.emit(ResponseRecord::failed(id, file_type)).await;
    }

    async fn emit(&self, record: ResponseRecord) {
        if let Err(err) = self.producer.publish(&record).await {
            tracing::warn!(error = %err, id = %record.id, "failed to produce response record");
        }
    }
}
