use crate::ids::JobId;
use crate::media_type::{JobStatus, MediaType};
use serde::{Deserialize, Serialize};

/// Terminal status record produced to `media-docker-files-response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: JobId,
    pub file_type: MediaType,
    pub status: JobStatus,
}

impl ResponseRecord {
    pub fn completed(id: JobId, file_type: MediaType) -> Self {
        Self {
            id,
            file_type,
            status: JobStatus::Completed,
        }
    }

    pub fn failed(id: JobId, file_type: MediaType) -> Self {
        Self {
            id,
            file_type,
            status: JobStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_spec_shape() {
        let r = ResponseRecord::completed(JobId::new(), MediaType::Audio);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["fileType"], "audio");
        assert_eq!(v["status"], "completed");
    }
}
