//! Per-IP token-bucket rate limiting, responding 429 once exhausted. One bucket per
//! client IP via `governor`'s keyed limiter, instead of the single global
//! limiter some call sites settle for — a shared backend's abusive client
//! shouldn't be able to throttle every other client's write traffic.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorTooManyRequests,
    Error,
};
use futures_util::future::LocalBoxFuture;
use governor::{DefaultKeyedRateLimiter, Quota};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 20,
            burst: 40,
        }
    }
}

#[derive(Clone)]
pub struct PerIpRateLimit {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl PerIpRateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst =
            NonZeroU32::new(config.burst.max(1)).expect("burst is clamped to at least 1");
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second.max(1))
                .expect("requests_per_second is clamped to at least 1"),
        )
        .allow_burst(burst);
        Self {
            limiter: Arc::new(governor::RateLimiter::keyed(quota)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PerIpRateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PerIpRateLimitService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(PerIpRateLimitService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct PerIpRateLimitService<S> {
    service: S,
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl<S, B> Service<ServiceRequest> for PerIpRateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = client_ip(&req);

        if self.limiter.check_key(&ip).is_err() {
            tracing::warn!(%ip, "rate limit exceeded");
            return Box::pin(async move { Err(ErrorTooManyRequests("rate limit exceeded")) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

/// Prefers the first address in `X-Forwarded-For` (trusting an upstream
/// proxy to have set it), falling back to the observed peer address.
fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| req.peer_addr().map(|addr| addr.ip()))
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn burst_then_throttle() {
        let config = RateLimitConfig {
            requests_per_second: 1,
            burst: 2,
        };
        let app = test::init_service(
            App::new()
                .wrap(PerIpRateLimit::new(config))
                .route("/", web::get().to(ok)),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);
        }

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let req = test::TestRequest::get()
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .to_srv_request();
        assert_eq!(client_ip(&req), IpAddr::from([203, 0, 113, 9]));
    }
}
