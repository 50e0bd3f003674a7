//! `failed-letter-queue` consumer: bounded re-execution of a job that
//! failed its first (primary-worker) attempt. Up to 3 further encoder
//! invocations are made here, so a job sees at most 4 encoder tries total
//! across its lifetime.

use crate::delete_workers::DeleteWorkers;
use crate::dispatch::Decoded;
use crate::response::ResponseEmitter;
use async_trait::async_trait;
use bus_adapter::{DeliveredRecord, RecordHandler};
use encoder_core::Encoder;
use media_types::{ArtifactLayout, DlqRecord};
use std::sync::Arc;

const MAX_ATTEMPTS: u32 = 3;

pub struct RetryHandler {
    layout: ArtifactLayout,
    encoder: Arc<dyn Encoder>,
    deletes: DeleteWorkers,
    response: Arc<ResponseEmitter>,
}

impl RetryHandler {
    pub fn new(
        layout: ArtifactLayout,
        encoder: Arc<dyn Encoder>,
        deletes: DeleteWorkers,
        response: Arc<ResponseEmitter>,
    ) -> Self {
        Self {
            layout,
            encoder,
            deletes,
            response,
        }
    }

    /// Removes the artifact location if present, then recreates it empty
    /// (directory artifacts) or ensures its parent exists (file artifacts).
    /// Called before the first attempt and again between each retry.
    async fn reset_output(&self, decoded: &Decoded, output_path: &std::path::Path) -> std::io::Result<()> {
        if decoded.is_directory_artifact() {
            if tokio::fs::metadata(output_path).await.is_ok() {
                tokio::fs::remove_dir_all(output_path).await?;
            }
            tokio::fs::create_dir_all(output_path).await?;
        } else {
            if tokio::fs::metadata(output_path).await.is_ok() {
                tokio::fs::remove_file(output_path).await?;
            }
            if let Some(parent) = output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        for job in decoded.encode_jobs(&self.layout) {
            tokio::fs::create_dir_all(job.output_dir()).await?;
        }
        Ok(())
    }

    /// Runs up to `MAX_ATTEMPTS` encoder passes, resetting the output
    /// location before each. Returns `Ok(())` on the first successful
    /// attempt, or the last attempt's error once all attempts are spent.
    async fn run_with_retries(&self, decoded: &Decoded, output_path: &std::path::Path) -> Result<(), String> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            if let Err(err) = self.reset_output(decoded, output_path).await {
                last_error = err.to_string();
                tracing::warn!(attempt, job_id = %decoded.job_id(), error = %last_error, "retry attempt failed to prepare output");
                continue;
            }

            let encode_jobs = decoded.encode_jobs(&self.layout);
            let mut failed = false;
            for job in &encode_jobs {
                if let Err(err) = self.encoder.encode(job).await {
                    last_error = err.to_string();
                    failed = true;
                    break;
                }
            }

            if !failed {
                tracing::info!(attempt, job_id = %decoded.job_id(), "retry attempt succeeded");
                return Ok(());
            }
            tracing::warn!(attempt, job_id = %decoded.job_id(), error = %last_error, "retry attempt failed");
        }

        Err(last_error)
    }
}

#[async_trait]
impl RecordHandler for RetryHandler {
    async fn handle(&self, record: DeliveredRecord<'_>) -> Result<(), String> {
        let dlq_record: DlqRecord = serde_json::from_slice(record.payload).map_err(|e| e.to_string())?;

        let decoded = match Decoded::from_dlq(&dlq_record) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::error!(
                    original_topic = %dlq_record.original_topic,
                    error = %err,
                    "DLQ record's original payload could not be decoded; no response emitted"
                );
                return Err(err.to_string());
            }
        };

        let output_path = decoded.output_path(&self.layout);
        let job_id = decoded.job_id();
        let media_type = decoded.media_type();
        let staging_file = decoded.staging_file();

        match self.run_with_retries(&decoded, &output_path).await {
            Ok(()) => {
                self.deletes.delete_file(staging_file);
                self.response.completed(job_id, media_type).await;
                Ok(())
            }
            Err(err) => {
                tracing::error!(%job_id, error = %err, "all retry attempts exhausted");
                if decoded.is_directory_artifact() {
                    let _ = tokio::fs::remove_dir_all(&output_path).await;
                } else {
                    let _ = tokio::fs::remove_file(&output_path).await;
                }
                self.deletes.delete_file(staging_file);
                self.response.failed(job_id, media_type).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use encoder_core::fake::FakeEncoder;
    use media_types::JobId;

    fn layout(dir: &std::path::Path) -> ArtifactLayout {
        ArtifactLayout::new(dir.join("staging"), dir.join("artifacts"))
    }

    fn dlq_for_image(id: JobId, raw: Vec<u8>) -> DlqRecord {
        DlqRecord {
            original_topic: "image".into(),
            partition: 0,
            offset: 0,
            high_watermark: 0,
            raw_value: raw,
            error: "encoder exited with status 1".into(),
            processed_at: Utc::now(),
            errored_at: Utc::now(),
            worker_id: "transcode-worker-1".into(),
            message: "ffmpeg failed".into(),
        }
    }

    fn record(payload: &[u8]) -> DeliveredRecord<'_> {
        DeliveredRecord {
            partition: 0,
            offset: 0,
            high_watermark: 0,
            payload,
        }
    }

    #[tokio::test]
    async fn succeeding_encoder_writes_the_artifact_and_cleans_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());
        let id = JobId::new();
        let staging_file = layout.staging_root().join("in.png");
        tokio::fs::create_dir_all(layout.staging_root()).await.unwrap();
        tokio::fs::write(&staging_file, b"x").await.unwrap();

        let raw = serde_json::to_vec(&serde_json::json!({
            "filePath": staging_file,
            "newId": id.to_string(),
        }))
        .unwrap();

        let handler = RetryHandler::new(
            layout.clone(),
            Arc::new(FakeEncoder::default()),
            DeleteWorkers::spawn(),
            Arc::new(ResponseEmitter::new(
                bus_adapter::Producer::new("localhost:9092", "media-docker-files-response").unwrap(),
            )),
        );

        let payload = serde_json::to_vec(&dlq_for_image(id, raw)).unwrap();
        handler.handle(record(&payload)).await.unwrap();

        assert!(tokio::fs::metadata(layout.image_path(id)).await.is_ok());
    }

    #[tokio::test]
    async fn exhausting_all_attempts_removes_the_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());
        let id = JobId::new();
        let staging_file = layout.staging_root().join("in.png");
        tokio::fs::create_dir_all(layout.staging_root()).await.unwrap();
        tokio::fs::write(&staging_file, b"x").await.unwrap();

        let raw = serde_json::to_vec(&serde_json::json!({
            "filePath": staging_file,
            "newId": id.to_string(),
        }))
        .unwrap();

        let handler = RetryHandler::new(
            layout.clone(),
            Arc::new(FakeEncoder::failing()),
            DeleteWorkers::spawn(),
            Arc::new(ResponseEmitter::new(
                bus_adapter::Producer::new("localhost:9092", "media-docker-files-response").unwrap(),
            )),
        );

        let payload = serde_json::to_vec(&dlq_for_image(id, raw)).unwrap();
        assert!(handler.handle(record(&payload)).await.is_err());

        assert!(tokio::fs::metadata(layout.image_path(id)).await.is_err());
    }

    #[tokio::test]
    async fn unknown_topic_is_rejected_without_a_response() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());

        let handler = RetryHandler::new(
            layout,
            Arc::new(FakeEncoder::default()),
            DeleteWorkers::spawn(),
            Arc::new(ResponseEmitter::new(
                bus_adapter::Producer::new("localhost:9092", "media-docker-files-response").unwrap(),
            )),
        );

        let dlq = DlqRecord {
            original_topic: "unknown".into(),
            partition: 0,
            offset: 0,
            high_watermark: 0,
            raw_value: b"{}".to_vec(),
            error: "x".into(),
            processed_at: Utc::now(),
            errored_at: Utc::now(),
            worker_id: "transcode-worker-1".into(),
            message: "x".into(),
        };
        let payload = serde_json::to_vec(&dlq).unwrap();
        assert!(handler.handle(record(&payload)).await.is_err());
    }
}
