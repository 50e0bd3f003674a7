use crate::ids::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio bitrate presets accepted by `POST /uploads/audio`. Absent means
/// "let the encoder pick its default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioBitrate {
    #[serde(rename = "128k")]
    K128,
    #[serde(rename = "192k")]
    K192,
    #[serde(rename = "256k")]
    K256,
    #[serde(rename = "320k")]
    K320,
}

impl AudioBitrate {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "128k" => Some(Self::K128),
            "192k" => Some(Self::K192),
            "256k" => Some(Self::K256),
            "320k" => Some(Self::K320),
            _ => None,
        }
    }

    pub fn as_ffmpeg_arg(&self) -> &'static str {
        match self {
            Self::K128 => "128k",
            Self::K192 => "192k",
            Self::K256 => "256k",
            Self::K320 => "320k",
        }
    }
}

/// One rendition requested of a `POST /uploads/videoResolutions` job.
/// Height selects the rendition; width is derived from a fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "360")]
    P360,
    #[serde(rename = "480")]
    P480,
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "1080")]
    P1080,
}

impl VideoResolution {
    pub const ALL: [VideoResolution; 4] =
        [Self::P360, Self::P480, Self::P720, Self::P1080];

    pub fn height(&self) -> u32 {
        match self {
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::P360 => 740,
            Self::P480 => 854,
            Self::P720 => 1280,
            Self::P1080 => 1920,
        }
    }

    pub fn dir_name(&self) -> String {
        self.height().to_string()
    }
}

/// Bitrate pair derived from a video `quality` parameter:
/// `video_kbps = 500 + (q-40)*15`, `audio_kbps = 64 + (q-40)*2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityBitrates {
    pub video_kbps: u32,
    pub audio_kbps: u32,
}

/// Validated video quality, constrained to `[40, 100]` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoQuality(u8);

impl VideoQuality {
    pub const MIN: u8 = 40;
    pub const MAX: u8 = 100;

    pub fn new(q: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&q) {
            Some(Self(q))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn bitrates(&self) -> QualityBitrates {
        let delta = (self.0 - Self::MIN) as u32;
        QualityBitrates {
            video_kbps: 500 + delta * 15,
            audio_kbps: 64 + delta * 2,
        }
    }
}

/// The bus payload for each of the five job topics. Serialized
/// as `{filePath, newId, ...extras}`, matching the source's field shape —
/// not as an externally-tagged enum, since each topic carries its own
/// schema and a consumer only ever decodes the variant for its own topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub file_path: PathBuf,
    pub new_id: JobId,
    pub quality: Option<VideoQuality>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResolutionsJob {
    pub file_path: PathBuf,
    pub new_id: JobId,
    pub resolutions: Vec<VideoResolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageJob {
    pub file_path: PathBuf,
    pub new_id: JobId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioJob {
    pub file_path: PathBuf,
    pub new_id: JobId,
    pub bitrate: Option<AudioBitrate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileJob {
    pub id: JobId,
    #[serde(rename = "type")]
    pub media_type: crate::media_type::MediaType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_bitrate_formula_matches_spec_example() {
        // quality=80 -> -b:v 1100k -b:a 144k
        let q = VideoQuality::new(80).unwrap();
        let b = q.bitrates();
        assert_eq!(b.video_kbps, 1100);
        assert_eq!(b.audio_kbps, 144);
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert!(VideoQuality::new(39).is_none());
        assert!(VideoQuality::new(101).is_none());
        assert!(VideoQuality::new(40).is_some());
        assert!(VideoQuality::new(100).is_some());
    }

    #[test]
    fn resolution_table_matches_spec() {
        assert_eq!(VideoResolution::P360.width(), 740);
        assert_eq!(VideoResolution::P480.width(), 854);
        assert_eq!(VideoResolution::P720.width(), 1280);
        assert_eq!(VideoResolution::P1080.width(), 1920);
    }

    #[test]
    fn video_job_serializes_to_camel_case_shape() {
        let job = VideoJob {
            file_path: "uploadStorage/abc.mp4".into(),
            new_id: JobId::new(),
            quality: VideoQuality::new(80),
        };
        let v = serde_json::to_value(&job).unwrap();
        assert!(v.get("filePath").is_some());
        assert!(v.get("newId").is_some());
    }
}
