//! Wire types and path layout shared by every media-docker service:
//! job records, the DLQ record, the response record, and the
//! `ArtifactLayout` path helper.

pub mod artifact;
pub mod dlq;
pub mod ids;
pub mod job;
pub mod media_type;
pub mod response;

pub use artifact::ArtifactLayout;
pub use dlq::DlqRecord;
pub use ids::{ChunkId, JobId};
pub use job::{
    AudioBitrate, AudioJob, DeleteFileJob, ImageJob, QualityBitrates, VideoJob, VideoQuality,
    VideoResolution, VideoResolutionsJob,
};
pub use media_type::{JobStatus, MediaType};
pub use response::ResponseRecord;
