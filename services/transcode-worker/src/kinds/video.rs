use crate::job_handler::JobKind;
use encoder_core::EncodeJob;
use media_types::{ArtifactLayout, JobId, MediaType, VideoJob};
use std::path::PathBuf;

pub struct VideoKind;

impl JobKind for VideoKind {
    type Job = VideoJob;

    const TOPIC: &'static str = "video";
    const MEDIA_TYPE: MediaType = MediaType::Video;
    const IS_DIRECTORY_ARTIFACT: bool = true;

    fn job_id(job: &Self::Job) -> JobId {
        job.new_id
    }

    fn staging_file(job: &Self::Job) -> PathBuf {
        job.file_path.clone()
    }

    fn output_path(layout: &ArtifactLayout, job: &Self::Job) -> PathBuf {
        layout.video_dir(job.new_id)
    }

    fn encode_jobs(layout: &ArtifactLayout, job: &Self::Job) -> Vec<EncodeJob> {
        vec![EncodeJob::Video {
            input: job.file_path.clone(),
            output_dir: layout.video_dir(job.new_id),
            quality: job.quality,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::VideoQuality;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("uploadStorage", "media_docker_files")
    }

    #[test]
    fn single_encode_job_targets_the_job_video_dir() {
        let l = layout();
        let job = VideoJob {
            file_path: "uploadStorage/abc.mp4".into(),
            new_id: JobId::new(),
            quality: VideoQuality::new(80),
        };
        let jobs = VideoKind::encode_jobs(&l, &job);
        assert_eq!(jobs.len(), 1);
        assert_eq!(VideoKind::output_path(&l, &job), l.video_dir(job.new_id));
    }

    #[test]
    fn is_a_directory_artifact() {
        assert!(VideoKind::IS_DIRECTORY_ARTIFACT);
    }
}
