//! `delete-file` consumer: removes an already-finished artifact. Unlike the
//! encoder-backed topics, failures here are logged only — no response
//! record and no DLQ, since there is no further retry path for a delete.

use async_trait::async_trait;
use bus_adapter::{DeliveredRecord, RecordHandler};
use media_types::{ArtifactLayout, DeleteFileJob, MediaType};

pub struct DeleteFileHandler {
    layout: ArtifactLayout,
}

impl DeleteFileHandler {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl RecordHandler for DeleteFileHandler {
    async fn handle(&self, record: DeliveredRecord<'_>) -> Result<(), String> {
        let job: DeleteFileJob =
            serde_json::from_slice(record.payload).map_err(|e| e.to_string())?;

        let path = match job.media_type {
            MediaType::Image => self.layout.image_path(job.id),
            MediaType::Audio => self.layout.audio_path(job.id),
            MediaType::Video | MediaType::VideoResolutions => self.layout.video_dir(job.id),
        };

        let result = if matches!(job.media_type, MediaType::Video | MediaType::VideoResolutions) {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        if let Err(err) = result {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, id = %job.id, path = %path.display(), "failed to delete artifact");
                return Err(err.to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::JobId;

    fn record(payload: &[u8]) -> DeliveredRecord<'_> {
        DeliveredRecord {
            partition: 0,
            offset: 0,
            high_watermark: 0,
            payload,
        }
    }

    #[tokio::test]
    async fn removes_an_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("staging"), dir.path().join("artifacts"));
        let id = JobId::new();
        let path = layout.image_path(id);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"jpeg-bytes").await.unwrap();

        let handler = DeleteFileHandler::new(layout);
        let payload = serde_json::to_vec(&serde_json::json!({ "id": id, "type": "image" })).unwrap();
        handler.handle(record(&payload)).await.unwrap();

        assert!(tokio::fs::metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn removes_a_video_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("staging"), dir.path().join("artifacts"));
        let id = JobId::new();
        let video_dir = layout.video_dir(id);
        tokio::fs::create_dir_all(&video_dir).await.unwrap();
        tokio::fs::write(video_dir.join("index.m3u8"), b"#EXTM3U\n").await.unwrap();

        let handler = DeleteFileHandler::new(layout);
        let payload = serde_json::to_vec(&serde_json::json!({ "id": id, "type": "video" })).unwrap();
        handler.handle(record(&payload)).await.unwrap();

        assert!(tokio::fs::metadata(&video_dir).await.is_err());
    }

    #[tokio::test]
    async fn missing_artifact_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("staging"), dir.path().join("artifacts"));
        let id = JobId::new();

        let handler = DeleteFileHandler::new(layout);
        let payload = serde_json::to_vec(&serde_json::json!({ "id": id, "type": "audio" })).unwrap();
        assert!(handler.handle(record(&payload)).await.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let layout = ArtifactLayout::new("staging", "artifacts");
        let handler = DeleteFileHandler::new(layout);
        assert!(handler.handle(record(b"not json")).await.is_err());
    }
}
