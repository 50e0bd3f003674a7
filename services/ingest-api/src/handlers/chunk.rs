//! `POST /api/v1/uploads/chunk` — the `start -> uploading* -> completed`
//! state machine. Field names: `type`, `status`, `chunk`, `chunkId`
//! (required once `status != start`), and the file part `{type}File`.

use crate::chunk_store::ChunkSession;
use crate::error::{HttpError, Result};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use error_types::AppError;
use futures_util::TryStreamExt;
use media_types::{ChunkId, MediaType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChunkStatus {
    Start,
    Uploading,
    Completed,
}

struct ParsedForm {
    media_type: MediaType,
    status: ChunkStatus,
    chunk_index: u32,
    chunk_id: Option<ChunkId>,
    file_bytes: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Serialize)]
pub struct ChunkResponse {
    #[serde(rename = "chunkId")]
    pub chunk_id: ChunkId,
    /// Present only once `status == completed`: the staging filename, used
    /// verbatim as `uuidFilename` by the job-creation endpoints.
    #[serde(skip_serializing_if = "Option::is_none", rename = "uuidFilename")]
    pub uuid_filename: Option<String>,
}

pub async fn upload_chunk(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let max_chunk = state.config.upload.max_chunk_bytes;
    let form = parse_form(&mut payload, max_chunk).await?;
    check_mime(&state, form.media_type, form.content_type.as_deref())?;

    match form.status {
        ChunkStatus::Start => handle_start(&state, form).await,
        ChunkStatus::Uploading => handle_uploading(&state, form).await,
        ChunkStatus::Completed => handle_completed(&state, form).await,
    }
}

async fn parse_form(payload: &mut Multipart, max_chunk: u64) -> Result<ParsedForm> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut saw_file = false;
    let mut content_type: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| HttpError(AppError::Validation(format!("malformed multipart body: {e}"))))?
    {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or("")
            .to_string();

        if name.ends_with("File") {
            saw_file = true;
            content_type = field.content_type().map(|m| m.to_string());
            while let Some(chunk) = field.try_next().await.map_err(|e| {
                HttpError(AppError::Validation(format!("malformed multipart body: {e}")))
            })? {
                if file_bytes.len() as u64 + chunk.len() as u64 > max_chunk {
                    return Err(HttpError(AppError::PayloadTooLarge(format!(
                        "chunk exceeds {max_chunk} bytes"
                    ))));
                }
                file_bytes.extend_from_slice(&chunk);
            }
        } else {
            let mut text = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(|e| {
                HttpError(AppError::Validation(format!("malformed multipart body: {e}")))
            })? {
                text.extend_from_slice(&chunk);
            }
            fields.insert(
                name,
                String::from_utf8(text)
                    .map_err(|_| HttpError(AppError::Validation("non-utf8 field value".into())))?,
            );
        }
    }

    if !saw_file {
        return Err(HttpError(AppError::Validation("missing file part".into())));
    }

    let type_str = fields
        .get("type")
        .ok_or_else(|| HttpError(AppError::Validation("missing `type` field".into())))?;
    let media_type = MediaType::from_upload_str(type_str)
        .ok_or_else(|| HttpError(AppError::Validation(format!("invalid type {type_str:?}"))))?;

    let status_str = fields
        .get("status")
        .ok_or_else(|| HttpError(AppError::Validation("missing `status` field".into())))?;
    let status: ChunkStatus = serde_json::from_value(serde_json::Value::String(status_str.clone()))
        .map_err(|_| HttpError(AppError::Validation(format!("invalid status {status_str:?}"))))?;

    let chunk_index: u32 = fields
        .get("chunk")
        .ok_or_else(|| HttpError(AppError::Validation("missing `chunk` field".into())))?
        .parse()
        .map_err(|_| HttpError(AppError::Validation("chunk must be a non-negative integer".into())))?;

    let chunk_id = match fields.get("chunkId") {
        Some(raw) => Some(
            ChunkId::parse(raw)
                .map_err(|_| HttpError(AppError::Validation("invalid chunkId".into())))?,
        ),
        None => None,
    };

    if status != ChunkStatus::Start && chunk_id.is_none() {
        return Err(HttpError(AppError::Validation(
            "chunkId is required once status != start".into(),
        )));
    }

    Ok(ParsedForm {
        media_type,
        status,
        chunk_index,
        chunk_id,
        file_bytes,
        content_type,
    })
}

fn check_mime(state: &AppState, media_type: MediaType, content_type: Option<&str>) -> Result<()> {
    let allowed = match media_type {
        MediaType::Image => &state.config.upload.allowed_image_types,
        MediaType::Video | MediaType::VideoResolutions => &state.config.upload.allowed_video_types,
        MediaType::Audio => &state.config.upload.allowed_audio_types,
    };

    match content_type {
        Some(ct) if allowed.iter().any(|a| a == ct) => Ok(()),
        Some(ct) => Err(HttpError(AppError::UnsupportedMediaType(format!(
            "{ct} is not an allowed {} MIME type",
            media_type.as_str()
        )))),
        None => Err(HttpError(AppError::UnsupportedMediaType(
            "file part is missing a content type".into(),
        ))),
    }
}

fn max_aggregate_for(state: &AppState, media_type: MediaType) -> u64 {
    match media_type {
        MediaType::Image => state.config.upload.max_image_bytes,
        MediaType::Audio => state.config.upload.max_audio_bytes,
        MediaType::Video | MediaType::VideoResolutions => state.config.upload.max_video_bytes,
    }
}

fn ext_for(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Image => "img",
        MediaType::Video | MediaType::VideoResolutions => "mp4",
        MediaType::Audio => "audio",
    }
}

async fn handle_start(state: &AppState, form: ParsedForm) -> Result<HttpResponse> {
    if form.chunk_index != 0 {
        return Err(HttpError(AppError::Validation(
            "the first chunk of a session must have index 0".into(),
        )));
    }

    let chunk_id = ChunkId::new();
    let ext = ext_for(form.media_type);
    let dir = state.layout.chunk_dir(form.media_type.as_str(), chunk_id, ext);
    tokio::fs::create_dir_all(&dir).await?;
    write_chunk_file(&state.layout, &dir, 0, &form.file_bytes).await?;

    state.chunks.start(
        chunk_id,
        ChunkSession {
            media_type: form.media_type,
            ext: ext.to_string(),
            dir,
            next_index: 1,
            bytes_so_far: form.file_bytes.len() as u64,
            started_at: Instant::now(),
        },
    );

    Ok(HttpResponse::Created().json(ChunkResponse {
        chunk_id,
        uuid_filename: None,
    }))
}

async fn handle_uploading(state: &AppState, form: ParsedForm) -> Result<HttpResponse> {
    let chunk_id = form.chunk_id.expect("validated above");
    let max_aggregate = max_aggregate_for(state, form.media_type);

    let session = state
        .chunks
        .accept_chunk(
            chunk_id,
            form.chunk_index,
            form.file_bytes.len() as u64,
            max_aggregate,
        )
        .map_err(chunk_error_to_http)?;

    write_chunk_file(&state.layout, &session.dir, form.chunk_index, &form.file_bytes).await?;

    Ok(HttpResponse::Ok().json(ChunkResponse {
        chunk_id,
        uuid_filename: None,
    }))
}

async fn handle_completed(state: &AppState, form: ParsedForm) -> Result<HttpResponse> {
    let chunk_id = form.chunk_id.expect("validated above");
    let max_aggregate = max_aggregate_for(state, form.media_type);

    // The final chunk arrives with `completed` and is itself appended
    // first, mirroring `uploading`, before reassembly runs.
    let session = state
        .chunks
        .accept_chunk(
            chunk_id,
            form.chunk_index,
            form.file_bytes.len() as u64,
            max_aggregate,
        )
        .map_err(chunk_error_to_http)?;
    write_chunk_file(&state.layout, &session.dir, form.chunk_index, &form.file_bytes).await?;

    let staging_file = state.layout.staging_file(chunk_id, &session.ext);
    concatenate_chunks(&session.dir, session.next_index, &staging_file).await?;

    // Best-effort cleanup of the now-redundant per-chunk directory.
    let dir = session.dir.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::fs::remove_dir_all(&dir).await {
            tracing::warn!(error = %err, dir = %dir.display(), "failed to remove chunk directory");
        }
    });

    state.chunks.remove(&chunk_id);

    Ok(HttpResponse::Ok().json(ChunkResponse {
        chunk_id,
        uuid_filename: Some(staging_file.display().to_string()),
    }))
}

async fn write_chunk_file(
    layout: &media_types::ArtifactLayout,
    dir: &std::path::Path,
    index: u32,
    bytes: &[u8],
) -> Result<()> {
    let path = layout.chunk_file(dir, index);
    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(HttpError::from)?;
    file.write_all(bytes).await.map_err(HttpError::from)?;
    Ok(())
}

async fn concatenate_chunks(
    dir: &std::path::Path,
    chunk_count: u32,
    destination: &std::path::Path,
) -> Result<()> {
    let mut out = tokio::fs::File::create(destination)
        .await
        .map_err(HttpError::from)?;
    for index in 0..chunk_count {
        let path = dir.join(format!("chunk_{index}"));
        let bytes = tokio::fs::read(&path).await.map_err(HttpError::from)?;
        out.write_all(&bytes).await.map_err(HttpError::from)?;
    }
    out.flush().await.map_err(HttpError::from)?;
    Ok(())
}

fn chunk_error_to_http(err: crate::chunk_store::ChunkError) -> HttpError {
    use crate::chunk_store::ChunkError::*;
    match err {
        UnknownSession => HttpError(AppError::Validation(
            "no in-progress upload for this chunkId".into(),
        )),
        OutOfOrder { expected, got } => HttpError(AppError::Validation(format!(
            "expected chunk index {expected}, got {got}"
        ))),
        AggregateTooLarge => {
            HttpError(AppError::PayloadTooLarge("upload exceeds the type's maximum size".into()))
        }
    }
}
