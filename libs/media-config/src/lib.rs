//! Environment-driven configuration, one set of structs shared by all three
//! binaries (`ingest-api`, `transcode-worker`, `retry-worker`). Each binary
//! reads only the sub-structs it needs; unused fields are simply not
//! consulted rather than split into separate `Config` types, following the
//! teacher's single `Config::from_env()` convention.

use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub kafka: KafkaConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
}

/// Host/port/env triple. `ingest-api` binds two listeners — the
/// authenticated write plane on `server_port` and the unauthenticated
/// static read plane on `client_port` — mirroring the two independently
/// configured ports the environment table calls for.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub client_port: u16,
    pub server_port: u16,
    pub env: String,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub client_origins: Vec<String>,
    pub server_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub server_key: String,
}

#[derive(Clone, Debug)]
pub struct KafkaConfig {
    pub brokers: String,
    pub group_prefix_id: Option<String>,
    pub video_workers: u32,
    pub video_resolutions_workers: u32,
    pub image_workers: u32,
    pub audio_workers: u32,
    pub delete_file_workers: u32,
    pub failed_workers: u32,
}

impl KafkaConfig {
    /// `consumer-{topic}-group`, optionally namespaced by an environment
    /// prefix so staging and production consumer groups never collide on
    /// a shared broker.
    pub fn group_id(&self, topic: &str) -> String {
        match &self.group_prefix_id {
            Some(prefix) => format!("{prefix}-consumer-{topic}-group"),
            None => format!("consumer-{topic}-group"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_image_bytes: u64,
    pub max_audio_bytes: u64,
    pub max_video_bytes: u64,
    pub max_chunk_bytes: u64,
    pub allowed_image_types: Vec<String>,
    pub allowed_video_types: Vec<String>,
    pub allowed_audio_types: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub staging_root: PathBuf,
    pub artifact_root: PathBuf,
    pub chunk_gc_interval: Duration,
    pub chunk_gc_max_age: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: env_or("HOST", "0.0.0.0"),
                client_port: parse_env("CLIENT_PORT", 8080)?,
                server_port: parse_env("SERVER_PORT", 8081)?,
                env: env_or("ENVIRONMENT", "development"),
                base_url: env_or("BASE_URL", "http://localhost:8080"),
            },
            cors: CorsConfig {
                client_origins: origin_list("ALLOWED_ORIGINS_CLIENT"),
                server_origins: origin_list("ALLOWED_ORIGINS_SERVER"),
            },
            auth: AuthConfig {
                server_key: std::env::var("SERVER_KEY")
                    .map_err(|_| ConfigError::Missing("SERVER_KEY"))?,
            },
            kafka: KafkaConfig {
                brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
                group_prefix_id: std::env::var("KAFKA_GROUP_PREFIX_ID").ok(),
                video_workers: parse_env("KAFKA_VIDEO_WORKERS", 2)?,
                video_resolutions_workers: parse_env("KAFKA_VIDEO_RESOLUTIONS_WORKERS", 2)?,
                image_workers: parse_env("KAFKA_IMAGE_WORKERS", 2)?,
                audio_workers: parse_env("KAFKA_AUDIO_WORKERS", 2)?,
                delete_file_workers: parse_env("KAFKA_DELETE_FILE_WORKERS", 1)?,
                failed_workers: parse_env("KAFKA_FAILED_WORKERS", 1)?,
            },
            upload: UploadConfig {
                max_image_bytes: parse_env("UPLOAD_MAX_IMAGE_BYTES", 50 * 1024 * 1024)?,
                max_audio_bytes: parse_env("UPLOAD_MAX_AUDIO_BYTES", 50 * 1024 * 1024)?,
                max_video_bytes: parse_env("UPLOAD_MAX_VIDEO_BYTES", 1024 * 1024 * 1024)?,
                max_chunk_bytes: parse_env("UPLOAD_MAX_CHUNK_BYTES", 2 * 1024 * 1024)?,
                allowed_image_types: csv_or(
                    "UPLOAD_ALLOWED_IMAGE_TYPES",
                    &["image/jpeg", "image/png", "image/webp"],
                ),
                allowed_video_types: csv_or(
                    "UPLOAD_ALLOWED_VIDEO_TYPES",
                    &["video/mp4", "video/quicktime", "video/webm", "video/x-msvideo"],
                ),
                allowed_audio_types: csv_or(
                    "UPLOAD_ALLOWED_AUDIO_TYPES",
                    &["audio/mpeg", "audio/wav", "audio/ogg", "audio/aac"],
                ),
            },
            storage: StorageConfig {
                staging_root: PathBuf::from(env_or("STAGING_ROOT", "uploadStorage")),
                artifact_root: PathBuf::from(env_or("ARTIFACT_ROOT", "media_docker_files")),
                chunk_gc_interval: Duration::from_secs(parse_env("CHUNK_GC_INTERVAL_SECS", 3600)?),
                chunk_gc_max_age: Duration::from_secs(parse_env("CHUNK_GC_MAX_AGE_SECS", 86400)?),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: key,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn csv_or(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn origin_list(key: &str) -> Vec<String> {
    csv_or(key, &["*"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch
    // them so they cannot interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "HOST",
            "CLIENT_PORT",
            "SERVER_PORT",
            "ENVIRONMENT",
            "BASE_URL",
            "ALLOWED_ORIGINS_CLIENT",
            "ALLOWED_ORIGINS_SERVER",
            "SERVER_KEY",
            "KAFKA_BROKERS",
            "KAFKA_GROUP_PREFIX_ID",
            "KAFKA_VIDEO_WORKERS",
            "CHUNK_GC_INTERVAL_SECS",
            "CHUNK_GC_MAX_AGE_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_server_key_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SERVER_KEY")));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("SERVER_KEY", "test-key");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.app.client_port, 8080);
        assert_eq!(cfg.kafka.video_workers, 2);
        assert_eq!(cfg.storage.chunk_gc_interval, Duration::from_secs(3600));
        assert_eq!(cfg.upload.max_chunk_bytes, 2 * 1024 * 1024);
        std::env::remove_var("SERVER_KEY");
    }

    #[test]
    fn group_id_honors_prefix() {
        let cfg = KafkaConfig {
            brokers: "localhost:9092".into(),
            group_prefix_id: Some("prod".into()),
            video_workers: 1,
            video_resolutions_workers: 1,
            image_workers: 1,
            audio_workers: 1,
            delete_file_workers: 1,
            failed_workers: 1,
        };
        assert_eq!(cfg.group_id("video"), "prod-consumer-video-group");

        let cfg_unprefixed = KafkaConfig {
            group_prefix_id: None,
            ..cfg
        };
        assert_eq!(cfg_unprefixed.group_id("video"), "consumer-video-group");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("SERVER_KEY", "test-key");
        std::env::set_var("CLIENT_PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CLIENT_PORT", .. }));
        std::env::remove_var("SERVER_KEY");
        std::env::remove_var("CLIENT_PORT");
    }
}
