//! Shared error types for the media-docker workspace.
//!
//! `AppError` is the domain error enum every crate maps its failures onto.
//! It carries no web-framework dependency so it can be used from the
//! ingest API, the transcode worker, and the retry worker alike. The
//! ingest API wraps it in a local newtype and implements
//! `actix_web::ResponseError` on that, the way `media-service/src/error.rs`
//! implements `ResponseError` on its own local `AppError`.

use serde::Serialize;
use std::fmt;

pub type Result<T> = std::result::Result<T, AppError>;

/// Stable machine-readable codes, mirrored in HTTP error bodies and logs.
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "UNSUPPORTED_MEDIA_TYPE";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const PRODUCE_ERROR: &str = "PRODUCE_ERROR";
    pub const ENCODE_ERROR: &str = "ENCODE_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application-level error. Each variant maps to one error class surfaced
/// across the write-plane API, the transcode worker, and the retry worker.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body, bad UUID, unknown `type`, bad chunk ordering.
    Validation(String),
    /// Requested resource (staging file, artifact) does not exist.
    NotFound(String),
    /// Missing/invalid bearer token, disallowed origin.
    Unauthorized(String),
    /// MIME type not in the allowed set for the declared media type.
    UnsupportedMediaType(String),
    /// A chunk, or the reassembled file, exceeds its configured limit.
    PayloadTooLarge(String),
    /// Per-IP rate limit exceeded.
    RateLimited(String),
    /// Filesystem read/write/create/remove failure.
    Io(String),
    /// Kafka produce failed (including circuit-breaker rejection).
    Produce(String),
    /// The external encoder exited non-zero or could not be spawned.
    Encode(String),
    /// A job/DLQ record failed to decode against its expected schema.
    Decode(String),
    /// Anything else unexpected.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(m) => write!(f, "validation error: {m}"),
            AppError::NotFound(m) => write!(f, "not found: {m}"),
            AppError::Unauthorized(m) => write!(f, "unauthorized: {m}"),
            AppError::UnsupportedMediaType(m) => write!(f, "unsupported media type: {m}"),
            AppError::PayloadTooLarge(m) => write!(f, "payload too large: {m}"),
            AppError::RateLimited(m) => write!(f, "rate limited: {m}"),
            AppError::Io(m) => write!(f, "I/O error: {m}"),
            AppError::Produce(m) => write!(f, "produce error: {m}"),
            AppError::Encode(m) => write!(f, "encode error: {m}"),
            AppError::Decode(m) => write!(f, "decode error: {m}"),
            AppError::Internal(m) => write!(f, "internal error: {m}"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::Unauthorized(_) => error_codes::UNAUTHORIZED,
            AppError::UnsupportedMediaType(_) => error_codes::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => error_codes::PAYLOAD_TOO_LARGE,
            AppError::RateLimited(_) => error_codes::RATE_LIMITED,
            AppError::Io(_) => error_codes::IO_ERROR,
            AppError::Produce(_) => error_codes::PRODUCE_ERROR,
            AppError::Encode(_) => error_codes::ENCODE_ERROR,
            AppError::Decode(_) => error_codes::DECODE_ERROR,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// JSON body shape returned by every write-plane endpoint on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(
        error: &str,
        message: &str,
        status: u16,
        error_type: &str,
        code: &str,
    ) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AppError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).code(),
            "PAYLOAD_TOO_LARGE"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app: AppError = io.into();
        assert!(matches!(app, AppError::Io(_)));
    }
}
