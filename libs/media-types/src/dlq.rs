use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dead-letter record published to `failed-letter-queue` by a primary
/// worker on processing failure.
///
/// `partition`/`offset` are informational only: offset `0` is a legal,
/// fresh-partition value and must never be treated as "missing".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqRecord {
    pub original_topic: String,
    pub partition: i32,
    pub offset: i64,
    pub high_watermark: i64,
    /// The raw, undecoded bytes of the original job record, carried as a
    /// base64 string on the wire (serde_json has no native bytes type; a
    /// plain `Vec<u8>` would serialize as a JSON array of integers).
    #[serde(with = "raw_value_base64")]
    pub raw_value: Vec<u8>,
    pub error: String,
    pub processed_at: DateTime<Utc>,
    pub errored_at: DateTime<Utc>,
    pub worker_id: String,
    pub message: String,
}

mod raw_value_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

impl DlqRecord {
    /// Best-effort recovery of the job UUID from the raw, possibly-malformed
    /// original payload, so a `failed` response can still be emitted even
    /// when the record itself never decoded cleanly.
    pub fn recover_job_id(&self) -> Option<media_id::RecoveredId> {
        let value: serde_json::Value = serde_json::from_slice(&self.raw_value).ok()?;
        let candidate = value.get("newId").or_else(|| value.get("id"))?;
        let s = candidate.as_str()?;
        uuid::Uuid::parse_str(s).ok().map(media_id::RecoveredId)
    }
}

/// Thin wrapper to keep the recovered-id type distinct from a trusted `JobId`.
pub mod media_id {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecoveredId(pub uuid::Uuid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::JobId;

    fn sample(raw_value: Vec<u8>) -> DlqRecord {
        DlqRecord {
            original_topic: "video".into(),
            partition: 0,
            offset: 0,
            high_watermark: 0,
            raw_value,
            error: "encoder exited with status 1".into(),
            processed_at: Utc::now(),
            errored_at: Utc::now(),
            worker_id: "transcode-worker-1".into(),
            message: "ffmpeg failed".into(),
        }
    }

    #[test]
    fn zero_offset_is_not_treated_as_missing() {
        let r = sample(b"{}".to_vec());
        // The type itself has no "is this offset missing" notion; this
        // test documents that offset 0 constructs and serializes fine.
        assert_eq!(r.offset, 0);
        assert_eq!(r.partition, 0);
        serde_json::to_string(&r).unwrap();
    }

    #[test]
    fn recovers_job_id_from_well_formed_raw_value() {
        let job_id = JobId::new();
        let raw = serde_json::json!({"filePath": "x", "newId": job_id.to_string()});
        let r = sample(serde_json::to_vec(&raw).unwrap());
        let recovered = r.recover_job_id().unwrap();
        assert_eq!(recovered.0, job_id.as_uuid());
    }

    #[test]
    fn malformed_raw_value_yields_no_recovery() {
        let r = sample(b"not json at all".to_vec());
        assert!(r.recover_job_id().is_none());
    }

    #[test]
    fn raw_value_serializes_as_base64_string_not_a_byte_array() {
        let r = sample(b"{}".to_vec());
        let value: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["rawValue"], serde_json::Value::String("e30=".into()));

        let round_tripped: DlqRecord = serde_json::from_value(value).unwrap();
        assert_eq!(round_tripped.raw_value, b"{}".to_vec());
    }
}
