//! Decodes a DLQ record's raw, original payload using the job schema named
//! by its `original_topic`, and exposes the per-type layout knowledge the
//! retry loop needs without committing to a trait-object abstraction — this
//! binary dispatches on one topic's worth of records, not four.

use encoder_core::EncodeJob;
use media_types::{
    ArtifactLayout, AudioJob, DlqRecord, ImageJob, JobId, MediaType, VideoJob, VideoResolutionsJob,
};
use std::path::PathBuf;

pub enum Decoded {
    Video(VideoJob),
    VideoResolutions(VideoResolutionsJob),
    Image(ImageJob),
    Audio(AudioJob),
}

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("unknown original topic {0:?}")]
    UnknownTopic(String),
    #[error("failed to decode job record: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Decoded {
    pub fn from_dlq(record: &DlqRecord) -> Result<Self, DispatchError> {
        match record.original_topic.as_str() {
            "video" => Ok(Decoded::Video(serde_json::from_slice(&record.raw_value)?)),
            "video-resolutions" => Ok(Decoded::VideoResolutions(serde_json::from_slice(
                &record.raw_value,
            )?)),
            "image" => Ok(Decoded::Image(serde_json::from_slice(&record.raw_value)?)),
            "audio" => Ok(Decoded::Audio(serde_json::from_slice(&record.raw_value)?)),
            other => Err(DispatchError::UnknownTopic(other.to_string())),
        }
    }

    pub fn job_id(&self) -> JobId {
        match self {
            Decoded::Video(j) => j.new_id,
            Decoded::VideoResolutions(j) => j.new_id,
            Decoded::Image(j) => j.new_id,
            Decoded::Audio(j) => j.new_id,
        }
    }

    pub fn staging_file(&self) -> PathBuf {
        match self {
            Decoded::Video(j) => j.file_path.clone(),
            Decoded::VideoResolutions(j) => j.file_path.clone(),
            Decoded::Image(j) => j.file_path.clone(),
            Decoded::Audio(j) => j.file_path.clone(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Decoded::Video(_) => MediaType::Video,
            Decoded::VideoResolutions(_) => MediaType::VideoResolutions,
            Decoded::Image(_) => MediaType::Image,
            Decoded::Audio(_) => MediaType::Audio,
        }
    }

    pub fn is_directory_artifact(&self) -> bool {
        matches!(self, Decoded::Video(_) | Decoded::VideoResolutions(_))
    }

    pub fn output_path(&self, layout: &ArtifactLayout) -> PathBuf {
        match self {
            Decoded::Video(j) => layout.video_dir(j.new_id),
            Decoded::VideoResolutions(j) => layout.video_dir(j.new_id),
            Decoded::Image(j) => layout.image_path(j.new_id),
            Decoded::Audio(j) => layout.audio_path(j.new_id),
        }
    }

    pub fn encode_jobs(&self, layout: &ArtifactLayout) -> Vec<EncodeJob> {
        match self {
            Decoded::Video(j) => vec![EncodeJob::Video {
                input: j.file_path.clone(),
                output_dir: layout.video_dir(j.new_id),
                quality: j.quality,
            }],
            Decoded::VideoResolutions(j) => j
                .resolutions
                .iter()
                .map(|resolution| EncodeJob::VideoResolution {
                    input: j.file_path.clone(),
                    output_dir: layout.video_resolution_dir(j.new_id, *resolution),
                    resolution: *resolution,
                })
                .collect(),
            Decoded::Image(j) => vec![EncodeJob::Image {
                input: j.file_path.clone(),
                output_file: layout.image_path(j.new_id),
            }],
            Decoded::Audio(j) => vec![EncodeJob::Audio {
                input: j.file_path.clone(),
                output_file: layout.audio_path(j.new_id),
                bitrate: j.bitrate,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dlq(topic: &str, raw_value: Vec<u8>) -> DlqRecord {
        DlqRecord {
            original_topic: topic.into(),
            partition: 0,
            offset: 0,
            high_watermark: 0,
            raw_value,
            error: "encoder exited with status 1".into(),
            processed_at: Utc::now(),
            errored_at: Utc::now(),
            worker_id: "transcode-worker-1".into(),
            message: "ffmpeg failed".into(),
        }
    }

    #[test]
    fn decodes_a_video_record_by_original_topic() {
        let id = JobId::new();
        let raw = serde_json::to_vec(&serde_json::json!({
            "filePath": "uploadStorage/a.mp4",
            "newId": id.to_string(),
            "quality": null,
        }))
        .unwrap();
        let decoded = Decoded::from_dlq(&dlq("video", raw)).unwrap();
        assert_eq!(decoded.job_id(), id);
        assert!(decoded.is_directory_artifact());
        assert_eq!(decoded.media_type(), MediaType::Video);
    }

    #[test]
    fn unknown_original_topic_is_rejected() {
        let err = Decoded::from_dlq(&dlq("unknown-topic", b"{}".to_vec())).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTopic(_)));
    }

    #[test]
    fn malformed_inner_payload_is_rejected() {
        let err = Decoded::from_dlq(&dlq("image", b"not json".to_vec())).unwrap_err();
        assert!(matches!(err, DispatchError::Decode(_)));
    }
}
