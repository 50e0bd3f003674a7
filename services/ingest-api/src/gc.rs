//! Background sweep reclaiming orphaned chunk-upload directories. A session
//! that never reaches `completed` (client crash, abandoned upload) leaves a
//! `chunkId` entry in the in-memory store and a directory on disk; this
//! periodically removes both once the session has been idle past the
//! configured age.

use crate::chunk_store::ChunkStore;
use crate::state::AppState;
use actix_web::web;
use std::time::Duration;
use tokio::sync::watch;

pub async fn run(
    state: web::Data<AppState>,
    interval: Duration,
    max_age: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                tracing::info!("chunk GC sweep shutting down");
                return;
            }
            _ = ticker.tick() => {
                sweep(&state.chunks, max_age).await;
            }
        }
    }
}

async fn sweep(chunks: &ChunkStore, max_age: Duration) {
    for (chunk_id, session) in chunks.stale_sessions(max_age) {
        tracing::warn!(%chunk_id, dir = %session.dir.display(), "reclaiming orphaned chunk session");
        if let Err(err) = tokio::fs::remove_dir_all(&session.dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, %chunk_id, "failed to remove orphaned chunk directory");
            }
        }
        chunks.remove(&chunk_id);
    }
}
