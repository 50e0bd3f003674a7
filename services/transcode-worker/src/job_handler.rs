//! Generic primary-job handler shared by the four encoder-backed topics
//! (`video`, `video-resolutions`, `image`, `audio`). Each topic supplies a
//! `JobKind` describing its wire type and path layout; this module owns the
//! decode → encode → success/failure plumbing all four share.

use crate::delete_workers::DeleteWorkers;
use crate::dlq::DlqEmitter;
use crate::response::ResponseEmitter;
use async_trait::async_trait;
use bus_adapter::{DeliveredRecord, RecordHandler};
use encoder_core::{EncodeError, Encoder, EncodeJob};
use media_types::{ArtifactLayout, JobId, MediaType};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-topic knowledge a generic handler needs: how to decode the record,
/// where its artifact lives, and which encoder invocations produce it.
pub trait JobKind: Send + Sync + 'static {
    type Job: DeserializeOwned + Send + Sync;

    const TOPIC: &'static str;
    const MEDIA_TYPE: MediaType;
    const IS_DIRECTORY_ARTIFACT: bool;

    fn job_id(job: &Self::Job) -> JobId;
    fn staging_file(job: &Self::Job) -> PathBuf;
    fn output_path(layout: &ArtifactLayout, job: &Self::Job) -> PathBuf;
    fn encode_jobs(layout: &ArtifactLayout, job: &Self::Job) -> Vec<EncodeJob>;
}

pub struct TypedJobHandler<K: JobKind> {
    layout: ArtifactLayout,
    encoder: Arc<dyn Encoder>,
    deletes: DeleteWorkers,
    dlq: Arc<DlqEmitter>,
    response: Arc<ResponseEmitter>,
    _marker: std::marker::PhantomData<K>,
}

impl<K: JobKind> TypedJobHandler<K> {
    pub fn new(
        layout: ArtifactLayout,
        encoder: Arc<dyn Encoder>,
        deletes: DeleteWorkers,
        dlq: Arc<DlqEmitter>,
        response: Arc<ResponseEmitter>,
    ) -> Self {
        Self {
            layout,
            encoder,
            deletes,
            dlq,
            response,
            _marker: std::marker::PhantomData,
        }
    }

    /// Recreates `path` (the job's top-level artifact location) empty —
    /// handling crash-recovery re-delivery, where a prior attempt may have
    /// left a partially-written directory — then ensures every individual
    /// encode job's own output directory exists underneath it.
    async fn prepare_output(&self, path: &std::path::Path, encode_jobs: &[EncodeJob]) -> std::io::Result<()> {
        if K::IS_DIRECTORY_ARTIFACT {
            if tokio::fs::metadata(path).await.is_ok() {
                tokio::fs::remove_dir_all(path).await?;
            }
            tokio::fs::create_dir_all(path).await?;
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        for job in encode_jobs {
            tokio::fs::create_dir_all(job.output_dir()).await?;
        }
        Ok(())
    }

    async fn run_encodes(&self, jobs: &[EncodeJob]) -> Result<(), EncodeError> {
        for job in jobs {
            self.encoder.encode(job).await?;
        }
        Ok(())
    }

    async fn on_malformed(&self, record: &DeliveredRecord<'_>, error: String) {
        tracing::error!(topic = K::TOPIC, error = %error, "malformed job record");
        match self.dlq.publish(K::TOPIC, record, error.clone(), "malformed job record".into()).await {
            Ok(dlq_record) => {
                if let Some(recovered) = dlq_record.recover_job_id() {
                    self.response
                        .failed(JobId::from(recovered.0), K::MEDIA_TYPE)
                        .await;
                }
            }
            Err(publish_err) => {
                tracing::error!(error = %publish_err, "failed to publish DLQ record for malformed job");
            }
        }
    }

    async fn on_failure(&self, job: &K::Job, output_path: &std::path::Path, record: &DeliveredRecord<'_>, error: String) {
        tracing::error!(topic = K::TOPIC, job_id = %K::job_id(job), error = %error, "job processing failed");

        if K::IS_DIRECTORY_ARTIFACT {
            self.deletes.delete_dir(output_path.to_path_buf());
        } else {
            self.deletes.delete_file(output_path.to_path_buf());
        }

        let job_id = K::job_id(job);
        match self.dlq.publish(K::TOPIC, record, error, "encoder failure".into()).await {
            Ok(_) => self.response.failed(job_id, K::MEDIA_TYPE).await,
            Err(publish_err) => {
                tracing::error!(error = %publish_err, %job_id, "failed to publish DLQ record; emitting failed response directly");
                self.response.failed(job_id, K::MEDIA_TYPE).await;
            }
        }
    }
}

#[async_trait]
impl<K: JobKind> RecordHandler for TypedJobHandler<K> {
    async fn handle(&self, record: DeliveredRecord<'_>) -> Result<(), String> {
        let job: K::Job = match serde_json::from_slice(record.payload) {
            Ok(job) => job,
            Err(err) => {
                self.on_malformed(&record, err.to_string()).await;
                return Err(err.to_string());
            }
        };

        let output_path = K::output_path(&self.layout, &job);
        let encode_jobs = K::encode_jobs(&self.layout, &job);

        if let Err(err) = self.prepare_output(&output_path, &encode_jobs).await {
            self.on_failure(&job, &output_path, &record, err.to_string()).await;
            return Err(err.to_string());
        }

        if let Err(err) = self.run_encodes(&encode_jobs).await {
            self.on_failure(&job, &output_path, &record, err.to_string()).await;
            return Err(err.to_string());
        }

        self.deletes.delete_file(K::staging_file(&job));
        self.response.completed(K::job_id(&job), K::MEDIA_TYPE).await;
        Ok(())
    }
}
