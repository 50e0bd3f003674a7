//! Ingest API entry point. Two listeners share one process: the write
//! plane (`SERVER_PORT`) behind bearer auth, per-IP rate limiting and a
//! permitted-origin CORS policy; the read plane (`CLIENT_PORT`) serving
//! finished artifacts as static files with a permissive origin policy.
//! Both run under one `tokio::task::JoinSet`; either one exiting tears
//! down the whole process.

mod chunk_store;
mod error;
mod gc;
mod handlers;
mod state;

use actix_web::{web, App, HttpServer};
use media_config::Config;
use state::AppState;
use std::io;
use tokio::sync::watch;
use tokio::task::JoinSet;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("failed to load configuration");
    let host = config.app.host.clone();
    let server_port = config.app.server_port;
    let client_port = config.app.client_port;
    let server_origins = config.cors.server_origins.clone();
    let client_origins = config.cors.client_origins.clone();
    let server_key = config.auth.server_key.clone();
    let gc_interval = config.storage.chunk_gc_interval;
    let gc_max_age = config.storage.chunk_gc_max_age;
    let artifact_root = config.storage.artifact_root.clone();

    let state = web::Data::new(AppState::new(config).expect("failed to initialize application state"));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let write_state = state.clone();
    let write_bind = format!("{host}:{server_port}");
    let write_server = HttpServer::new(move || {
        let cors = build_cors(&server_origins);
        let authenticated = web::scope("/api/v1")
            .wrap(web_middleware::PerIpRateLimit::new(
                web_middleware::RateLimitConfig::default(),
            ))
            .wrap(web_middleware::BearerAuth::new(server_key.clone()))
            .route("/uploads/chunk", web::post().to(handlers::chunk::upload_chunk))
            .route("/uploads/video", web::post().to(handlers::jobs::create_video))
            .route(
                "/uploads/videoResolutions",
                web::post().to(handlers::jobs::create_video_resolutions),
            )
            .route("/uploads/image", web::post().to(handlers::jobs::create_image))
            .route("/uploads/audio", web::post().to(handlers::jobs::create_audio))
            .route(
                "/destroys/delete-file",
                web::delete().to(handlers::delete::delete_file),
            );

        App::new()
            .wrap(cors)
            .wrap(web_middleware::AccessLog)
            .wrap(web_middleware::CorrelationId)
            .app_data(write_state.clone())
            // Ambient surface: reachable without a bearer token or rate limiting,
            // since orchestrator health probes, scrapers and the connectivity
            // check don't carry one.
            .route("/metrics", web::get().to(handlers::health::metrics))
            .route("/api/v1/health/ready", web::get().to(handlers::health::ready))
            .route("/api/v1/health/live", web::get().to(handlers::health::live))
            .route(
                "/api/v1/connections/connect",
                web::get().to(handlers::health::connect),
            )
            .service(authenticated)
    })
    .bind(&write_bind)?
    .run();

    let read_state = state.clone();
    let read_bind = format!("{host}:{client_port}");
    let read_server = HttpServer::new(move || {
        let cors = build_cors(&client_origins);
        App::new()
            .wrap(cors)
            .wrap(web_middleware::AccessLog)
            .app_data(read_state.clone())
            .route("/", web::get().to(handlers::health::root))
            .service(actix_files::Files::new("/media_docker_files", artifact_root.clone()))
    })
    .bind(&read_bind)?
    .run();

    let gc_state = state.clone();
    let gc_shutdown = shutdown_rx.clone();

    let mut tasks = JoinSet::new();
    tasks.spawn(async move {
        tracing::info!("ingest-api write plane listening");
        write_server.await
    });
    tasks.spawn(async move {
        tracing::info!("ingest-api read plane listening");
        read_server.await
    });
    tasks.spawn(async move {
        gc::run(gc_state, gc_interval, gc_max_age, gc_shutdown).await;
        Ok::<(), io::Error>(())
    });

    let mut first_error = None;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {
                tracing::warn!("a server task completed");
            }
            Ok(Err(e)) => {
                tracing::error!("server task failed: {e}");
                let _ = shutdown_tx.send(true);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(e) => {
                tracing::error!("task join error: {e}");
                let _ = shutdown_tx.send(true);
                if first_error.is_none() {
                    first_error = Some(io::Error::other(e.to_string()));
                }
            }
        }
    }

    tracing::info!("ingest-api shutting down");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn build_cors(origins: &[String]) -> actix_cors::Cors {
    let mut cors = actix_cors::Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
