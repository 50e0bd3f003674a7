use crate::job_handler::JobKind;
use encoder_core::EncodeJob;
use media_types::{ArtifactLayout, AudioJob, JobId, MediaType};
use std::path::PathBuf;

pub struct AudioKind;

impl JobKind for AudioKind {
    type Job = AudioJob;

    const TOPIC: &'static str = "audio";
    const MEDIA_TYPE: MediaType = MediaType::Audio;
    const IS_DIRECTORY_ARTIFACT: bool = false;

    fn job_id(job: &Self::Job) -> JobId {
        job.new_id
    }

    fn staging_file(job: &Self::Job) -> PathBuf {
        job.file_path.clone()
    }

    fn output_path(layout: &ArtifactLayout, job: &Self::Job) -> PathBuf {
        layout.audio_path(job.new_id)
    }

    fn encode_jobs(layout: &ArtifactLayout, job: &Self::Job) -> Vec<EncodeJob> {
        vec![EncodeJob::Audio {
            input: job.file_path.clone(),
            output_file: layout.audio_path(job.new_id),
            bitrate: job.bitrate,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::AudioBitrate;

    #[test]
    fn bitrate_carries_through_to_the_encode_job() {
        let l = ArtifactLayout::new("uploadStorage", "media_docker_files");
        let job = AudioJob {
            file_path: "uploadStorage/abc.wav".into(),
            new_id: JobId::new(),
            bitrate: AudioBitrate::parse("192k"),
        };
        match &AudioKind::encode_jobs(&l, &job)[0] {
            EncodeJob::Audio { bitrate, .. } => assert_eq!(*bitrate, AudioBitrate::parse("192k")),
            other => panic!("expected Audio encode job, got {other:?}"),
        }
    }
}
