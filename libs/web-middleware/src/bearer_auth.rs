//! Bearer-token guard for the ingest API's write plane: requires
//! `Authorization: Bearer {SERVER_KEY}` on write routes, 403 on mismatch.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorForbidden,
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;

#[derive(Clone)]
pub struct BearerAuth {
    expected: Arc<String>,
}

impl BearerAuth {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            expected: Arc::new(server_key.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service,
            expected: self.expected.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: S,
    expected: Arc<String>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
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
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let authorized = match token {
            Some(token) => constant_time_eq(token.as_bytes(), self.expected.as_bytes()),
            None => false,
        };

        if !authorized {
            return Box::pin(async move { Err(ErrorForbidden("invalid or missing bearer token")) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

/// Compares two byte strings in time independent of where they first
/// differ, so mismatched-key responses can't be distinguished by timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::header, test, web, App, HttpResponse};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn rejects_missing_header() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new("secret"))
                .route("/", web::get().to(ok)),
        )
        .await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }

    #[actix_rt::test]
    async fn rejects_wrong_token() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new("secret"))
                .route("/", web::get().to(ok)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, "Bearer nope"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }

    #[actix_rt::test]
    async fn accepts_matching_token() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new("secret"))
                .route("/", web::get().to(ok)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, "Bearer secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
