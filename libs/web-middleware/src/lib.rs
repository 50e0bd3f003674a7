//! Actix-web middleware shared by the ingest API's write and read planes:
//! bearer-token auth, per-IP rate limiting, correlation IDs, access logs.

pub mod access_log;
pub mod bearer_auth;
pub mod correlation_id;
pub mod rate_limit;

pub use access_log::AccessLog;
pub use bearer_auth::BearerAuth;
pub use correlation_id::CorrelationId;
pub use rate_limit::{PerIpRateLimit, RateLimitConfig};
