use crate::job_handler::JobKind;
use encoder_core::EncodeJob;
use media_types::{ArtifactLayout, ImageJob, JobId, MediaType};
use std::path::PathBuf;

pub struct ImageKind;

impl JobKind for ImageKind {
    type Job = ImageJob;

    const TOPIC: &'static str = "image";
    const MEDIA_TYPE: MediaType = MediaType::Image;
    const IS_DIRECTORY_ARTIFACT: bool = false;

    fn job_id(job: &Self::Job) -> JobId {
        job.new_id
    }

    fn staging_file(job: &Self::Job) -> PathBuf {
        job.file_path.clone()
    }

    fn output_path(layout: &ArtifactLayout, job: &Self::Job) -> PathBuf {
        layout.image_path(job.new_id)
    }

    fn encode_jobs(layout: &ArtifactLayout, job: &Self::Job) -> Vec<EncodeJob> {
        vec![EncodeJob::Image {
            input: job.file_path.clone(),
            output_file: layout.image_path(job.new_id),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_artifact_is_a_single_file() {
        assert!(!ImageKind::IS_DIRECTORY_ARTIFACT);
        let l = ArtifactLayout::new("uploadStorage", "media_docker_files");
        let job = ImageJob {
            file_path: "uploadStorage/abc.png".into(),
            new_id: JobId::new(),
        };
        assert_eq!(ImageKind::output_path(&l, &job), l.image_path(job.new_id));
        assert_eq!(ImageKind::staging_file(&job), job.file_path);
    }
}
