//! Maps the shared `error_types::AppError` onto HTTP responses. A local
//! newtype, not an impl directly on `error_types::AppError`, since neither
//! that type nor `ResponseError` lives in this crate.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{AppError, ErrorResponse};

pub type Result<T> = std::result::Result<T, HttpError>;

#[derive(Debug)]
pub struct HttpError(pub AppError);

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        HttpError(err)
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError(AppError::from(err))
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError(AppError::from(err))
    }
}

impl From<bus_adapter::BusError> for HttpError {
    fn from(err: bus_adapter::BusError) -> Self {
        HttpError(AppError::Produce(err.to_string()))
    }
}

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            // The write plane's documented code set has no 404; an
            // unresolvable resource is reported as bad data instead.
            AppError::Validation(_) | AppError::NotFound(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Io(_)
            | AppError::Produce(_)
            | AppError::Encode(_)
            | AppError::Decode(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = match &self.0 {
            AppError::Validation(_) | AppError::NotFound(_) => "validation_error",
            AppError::Unauthorized(_) => "authorization_error",
            AppError::UnsupportedMediaType(_) => "unsupported_media_type",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::RateLimited(_) => "rate_limited",
            _ => "server_error",
        };

        let body = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &self.0.to_string(),
            status.as_u16(),
            error_type,
            self.0.code(),
        );

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, code = self.0.code(), "request failed");
        } else {
            tracing::warn!(error = %self.0, code = self.0.code(), "request rejected");
        }

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_bad_request_not_404() {
        let err = HttpError(AppError::NotFound("x".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn payload_too_large_maps_to_413() {
        let err = HttpError(AppError::PayloadTooLarge("x".into()));
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
