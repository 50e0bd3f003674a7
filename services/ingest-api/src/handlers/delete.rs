//! `DELETE /api/v1/destroys/delete-file`: validates the artifact exists on disk,
//! publishes a `delete-file` job record, returns 200. Removal itself
//! happens asynchronously once the transcode worker's delete-file handler
//! dequeues the record.

use crate::error::{HttpError, Result};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use error_types::AppError;
use media_types::{DeleteFileJob, JobId, MediaType};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct DeleteFileRequest {
    id: JobId,
    #[serde(rename = "type")]
    media_type: String,
}

fn artifact_path_for(state: &AppState, id: JobId, media_type: MediaType) -> std::path::PathBuf {
    match media_type {
        MediaType::Image => state.layout.image_path(id),
        MediaType::Audio => state.layout.audio_path(id),
        MediaType::Video | MediaType::VideoResolutions => state.layout.video_dir(id),
    }
}

pub async fn delete_file(
    state: web::Data<AppState>,
    body: web::Json<DeleteFileRequest>,
) -> Result<HttpResponse> {
    let media_type = MediaType::from_upload_str(&body.media_type)
        .ok_or_else(|| HttpError(AppError::Validation(format!("invalid type {:?}", body.media_type))))?;

    let path = artifact_path_for(&state, body.id, media_type);
    if tokio::fs::metadata(&path).await.is_err() {
        return Err(HttpError(AppError::NotFound(format!(
            "no artifact at {}",
            path.display()
        ))));
    }

    let job = DeleteFileJob {
        id: body.id,
        media_type,
    };

    state.delete_file_producer.publish(&job).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": body.id })))
}
