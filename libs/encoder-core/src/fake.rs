//! In-process fake encoder for tests that don't want a real `ffmpeg` on
//! `PATH`. Records invocations and touches plausible output paths so
//! downstream assertions about artifact existence still hold.

use crate::{EncodeError, EncodeJob, Encoder};
use async_trait::async_trait;
use std::sync::Mutex;

pub struct FakeEncoder {
    pub fail: bool,
    calls: Mutex<Vec<EncodeJob>>,
}

impl Default for FakeEncoder {
    fn default() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeEncoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError> {
        self.calls.lock().unwrap().push(job.clone());
        if self.fail {
            return Err(EncodeError::NonZeroExit(1));
        }

        match job {
            EncodeJob::Video { output_dir, .. } | EncodeJob::VideoResolution { output_dir, .. } => {
                std::fs::create_dir_all(output_dir).map_err(EncodeError::Spawn)?;
                std::fs::write(output_dir.join("index.m3u8"), b"#EXTM3U\n")
                    .map_err(EncodeError::Spawn)?;
            }
            EncodeJob::Image { output_file, .. } | EncodeJob::Audio { output_file, .. } => {
                if let Some(parent) = output_file.parent() {
                    std::fs::create_dir_all(parent).map_err(EncodeError::Spawn)?;
                }
                std::fs::write(output_file, b"fake-artifact").map_err(EncodeError::Spawn)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeding_fake_writes_an_artifact() {
        let dir = tempdir();
        let encoder = FakeEncoder::default();
        let job = EncodeJob::Image {
            input: "in.png".into(),
            output_file: dir.join("out.jpeg"),
        };
        encoder.encode(&job).await.unwrap();
        assert!(dir.join("out.jpeg").exists());
        assert_eq!(encoder.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_fake_returns_an_error() {
        let encoder = FakeEncoder::failing();
        let job = EncodeJob::Image {
            input: "in.png".into(),
            output_file: "out.jpeg".into(),
        };
        assert!(encoder.encode(&job).await.is_err());
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("encoder-core-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
