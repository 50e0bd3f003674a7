use crate::state::AppState;
use actix_web::{web, HttpResponse, Responder};

pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "service": "ingest-api" }))
}

/// `GET /api/v1/connections/connect` — unauthenticated connectivity check.
pub async fn connect() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Process-level liveness: the handler itself being reachable is the check.
pub async fn live() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Readiness additionally reports each job producer's circuit-breaker
/// state, since a tripped breaker means uploads will fail even though the
/// process itself is alive.
pub async fn ready(state: web::Data<AppState>) -> impl Responder {
    let breakers = serde_json::json!({
        "video": format!("{:?}", state.video_producer.circuit_state()),
        "videoResolutions": format!("{:?}", state.video_resolutions_producer.circuit_state()),
        "image": format!("{:?}", state.image_producer.circuit_state()),
        "audio": format!("{:?}", state.audio_producer.circuit_state()),
        "deleteFile": format!("{:?}", state.delete_file_producer.circuit_state()),
    });

    let any_open = [
        state.video_producer.circuit_state(),
        state.video_resolutions_producer.circuit_state(),
        state.image_producer.circuit_state(),
        state.audio_producer.circuit_state(),
        state.delete_file_producer.circuit_state(),
    ]
    .iter()
    .any(|s| *s == resilience::CircuitState::Open);

    let status = if any_open { "degraded" } else { "ready" };
    let body = serde_json::json!({ "status": status, "producers": breakers });

    if any_open {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

/// Prometheus exposition over the process-wide default registry, picking up
/// whatever `bus-adapter`'s and `resilience`'s `metrics` features registered.
pub async fn metrics() -> impl Responder {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %err, "failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
