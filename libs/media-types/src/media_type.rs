use serde::{Deserialize, Serialize};

/// The four media kinds the ingest API accepts and the transcode worker
/// dispatches on. `VideoResolutions` is video with multiple quality
/// renditions; it shares the `videos/{jobId}/` artifact root with `Video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    Image,
    Video,
    VideoResolutions,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::VideoResolutions => "videoResolutions",
            MediaType::Audio => "audio",
        }
    }

    /// Topic name this media type is published to and dispatched from.
    pub fn topic(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::VideoResolutions => "video-resolutions",
            MediaType::Audio => "audio",
        }
    }

    /// Parses the `type` field of `POST /uploads/chunk` and `DELETE
    /// /destroys/delete-file`. `delete-file` only ever names image, video,
    /// or audio — a multi-resolution video is deleted via its `Video`
    /// artifact directory, which is the same directory a single-quality
    /// video uses.
    pub fn from_upload_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            "audio" => Some(MediaType::Audio),
            _ => None,
        }
    }
}

/// Terminal outcome carried on a `ResponseRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_match_spec_glossary() {
        assert_eq!(MediaType::VideoResolutions.topic(), "video-resolutions");
        assert_eq!(MediaType::Image.topic(), "image");
    }

    #[test]
    fn upload_str_excludes_video_resolutions() {
        assert!(MediaType::from_upload_str("videoResolutions").is_none());
        assert_eq!(MediaType::from_upload_str("video"), Some(MediaType::Video));
    }
}
