use crate::job_handler::JobKind;
use encoder_core::EncodeJob;
use media_types::{ArtifactLayout, JobId, MediaType, VideoResolutionsJob};
use std::path::PathBuf;

pub struct VideoResolutionsKind;

impl JobKind for VideoResolutionsKind {
    type Job = VideoResolutionsJob;

    const TOPIC: &'static str = "video-resolutions";
    const MEDIA_TYPE: MediaType = MediaType::VideoResolutions;
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

    /// One encoder invocation per requested resolution, each writing into
    /// its own `{jobId}/{height}/` subdirectory. A failure in any
    /// resolution fails the whole job — the artifact directory is shared,
    /// so a partial rendition set is not considered a usable result.
    fn encode_jobs(layout: &ArtifactLayout, job: &Self::Job) -> Vec<EncodeJob> {
        job.resolutions
            .iter()
            .map(|resolution| EncodeJob::VideoResolution {
                input: job.file_path.clone(),
                output_dir: layout.video_resolution_dir(job.new_id, *resolution),
                resolution: *resolution,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::VideoResolution;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("uploadStorage", "media_docker_files")
    }

    #[test]
    fn one_encode_job_per_requested_resolution() {
        let l = layout();
        let job = VideoResolutionsJob {
            file_path: "uploadStorage/abc.mp4".into(),
            new_id: JobId::new(),
            resolutions: vec![VideoResolution::P360, VideoResolution::P1080],
        };
        let jobs = VideoResolutionsKind::encode_jobs(&l, &job);
        assert_eq!(jobs.len(), 2);
        match &jobs[1] {
            EncodeJob::VideoResolution { output_dir, resolution, .. } => {
                assert_eq!(*resolution, VideoResolution::P1080);
                assert_eq!(*output_dir, l.video_resolution_dir(job.new_id, VideoResolution::P1080));
            }
            other => panic!("expected VideoResolution encode job, got {other:?}"),
        }
    }
}
