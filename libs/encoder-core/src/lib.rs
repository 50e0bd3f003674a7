//! The external encoder is treated as a black-box subprocess: this crate
//! owns only the argument shape and process invocation, never the binary
//! itself.

use async_trait::async_trait;
use media_types::{AudioBitrate, VideoQuality, VideoResolution};
use std::path::PathBuf;
use std::process::Stdio;

#[cfg(feature = "test-util")]
pub mod fake;

/// A fixed, conservative JPEG quality used for every image job — the
/// source exposes no per-request image quality parameter.
const IMAGE_QVAL: u8 = 2;

#[derive(Debug, Clone)]
pub enum EncodeJob {
    /// Single-rendition video: HLS segments + `index.m3u8` under `output_dir`.
    Video {
        input: PathBuf,
        output_dir: PathBuf,
        quality: Option<VideoQuality>,
    },
    /// One rendition of a multi-resolution video job.
    VideoResolution {
        input: PathBuf,
        output_dir: PathBuf,
        resolution: VideoResolution,
    },
    Image { input: PathBuf, output_file: PathBuf },
    Audio {
        input: PathBuf,
        output_file: PathBuf,
        bitrate: Option<AudioBitrate>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to spawn encoder: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("encoder exited with status {0}")]
    NonZeroExit(i32),
    #[error("encoder terminated by signal")]
    Terminated,
}

#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError>;
}

impl EncodeJob {
    /// The directory the encoder writes into — for file-based artifacts,
    /// the output file's parent. Callers create this before invoking the
    /// encoder; ffmpeg does not create intermediate directories itself.
    pub fn output_dir(&self) -> &std::path::Path {
        match self {
            EncodeJob::Video { output_dir, .. } => output_dir,
            EncodeJob::VideoResolution { output_dir, .. } => output_dir,
            EncodeJob::Image { output_file, .. } => {
                output_file.parent().unwrap_or(std::path::Path::new("."))
            }
            EncodeJob::Audio { output_file, .. } => {
                output_file.parent().unwrap_or(std::path::Path::new("."))
            }
        }
    }
}

/// Builds the `ffmpeg` argument list for a job.
pub fn build_args(job: &EncodeJob) -> Vec<String> {
    match job {
        EncodeJob::Video { input, output_dir, quality } => {
            let mut args = vec![
                "-i".into(),
                input.display().to_string(),
                "-codec:v".into(),
                "libx264".into(),
                "-codec:a".into(),
                "aac".into(),
            ];
            if let Some(q) = quality {
                let b = q.bitrates();
                args.push("-b:v".into());
                args.push(format!("{}k", b.video_kbps));
                args.push("-b:a".into());
                args.push(format!("{}k", b.audio_kbps));
            }
            args.extend([
                "-hls_time".into(),
                "10".into(),
                "-hls_playlist_type".into(),
                "vod".into(),
                "-hls_segment_filename".into(),
                format!("{}/segment%03d.ts", output_dir.display()),
                "-start_number".into(),
                "0".into(),
                format!("{}/index.m3u8", output_dir.display()),
            ]);
            args
        }
        EncodeJob::VideoResolution { input, output_dir, resolution } => {
            let mut args = vec![
                "-i".into(),
                input.display().to_string(),
                "-codec:v".into(),
                "libx264".into(),
                "-codec:a".into(),
                "aac".into(),
                "-vf".into(),
                format!("scale={}:{}", resolution.width(), resolution.height()),
            ];
            args.extend([
                "-hls_time".into(),
                "10".into(),
                "-hls_playlist_type".into(),
                "vod".into(),
                "-hls_segment_filename".into(),
                format!("{}/segment%03d.ts", output_dir.display()),
                "-start_number".into(),
                "0".into(),
                format!("{}/index.m3u8", output_dir.display()),
            ]);
            args
        }
        EncodeJob::Image { input, output_file } => vec![
            "-i".into(),
            input.display().to_string(),
            "-q:v".into(),
            IMAGE_QVAL.to_string(),
            output_file.display().to_string(),
        ],
        EncodeJob::Audio { input, output_file, bitrate } => {
            let mut args = vec![
                "-i".into(),
                input.display().to_string(),
                "-vn".into(),
                "-ar".into(),
                "44100".into(),
                "-ac".into(),
                "2".into(),
            ];
            if let Some(b) = bitrate {
                args.push("-b:a".into());
                args.push(b.as_ffmpeg_arg().to_string());
            }
            args.push(output_file.display().to_string());
            args
        }
    }
}

pub struct FfmpegEncoder {
    binary: String,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self { binary: "ffmpeg".into() }
    }
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError> {
        let args = build_args(job);
        tracing::debug!(binary = %self.binary, ?args, "invoking encoder");

        let status = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .status()
            .await?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(EncodeError::NonZeroExit(code)),
            None => Err(EncodeError::Terminated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::VideoResolution;

    #[test]
    fn video_args_include_bitrate_when_quality_present() {
        let job = EncodeJob::Video {
            input: "in.mp4".into(),
            output_dir: "out".into(),
            quality: VideoQuality::new(80),
        };
        let args = build_args(&job);
        assert!(args.iter().any(|a| a == "1100k"));
        assert!(args.iter().any(|a| a == "144k"));
    }

    #[test]
    fn video_args_omit_bitrate_when_quality_absent() {
        let job = EncodeJob::Video {
            input: "in.mp4".into(),
            output_dir: "out".into(),
            quality: None,
        };
        let args = build_args(&job);
        assert!(!args.iter().any(|a| a == "-b:v"));
    }

    #[test]
    fn resolution_args_scale_to_the_spec_table() {
        let job = EncodeJob::VideoResolution {
            input: "in.mp4".into(),
            output_dir: "out/720".into(),
            resolution: VideoResolution::P720,
        };
        let args = build_args(&job);
        assert!(args.iter().any(|a| a == "scale=1280:720"));
    }

    #[test]
    fn audio_args_include_bitrate_when_present() {
        let job = EncodeJob::Audio {
            input: "in.wav".into(),
            output_file: "out.mp3".into(),
            bitrate: AudioBitrate::parse("192k"),
        };
        let args = build_args(&job);
        assert!(args.iter().any(|a| a == "192k"));
    }

    #[test]
    fn image_args_use_fixed_quality() {
        let job = EncodeJob::Image {
            input: "in.png".into(),
            output_file: "out.jpeg".into(),
        };
        let args = build_args(&job);
        let idx = args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(args[idx + 1], IMAGE_QVAL.to_string());
    }
}
