//! `POST /api/v1/uploads/{video,videoResolutions,image,audio}`: validate the
//! staging file exists, mint a job UUID, publish the typed job record, and
//! return the synthetic artifact URL the caller will eventually be able to
//! fetch from the read plane.

use crate::error::{HttpError, Result};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use error_types::AppError;
use media_types::{
    AudioBitrate, AudioJob, ImageJob, JobId, VideoJob, VideoQuality, VideoResolution,
    VideoResolutionsJob,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct UploadAccepted {
    id: JobId,
    #[serde(rename = "fileUrl")]
    file_url: String,
}

async fn staging_path_for(state: &AppState, uuid_filename: &str) -> Result<std::path::PathBuf> {
    let path = std::path::PathBuf::from(uuid_filename);
    if !path.starts_with(state.layout.staging_root()) {
        return Err(HttpError(AppError::Validation(
            "uuidFilename must name a staged file".into(),
        )));
    }
    if tokio::fs::metadata(&path).await.is_err() {
        return Err(HttpError(AppError::NotFound(format!(
            "no staged file at {}",
            path.display()
        ))));
    }
    Ok(path)
}

/// On publish failure the staging file is scheduled for deletion and a 500
/// surfaces to the caller.
async fn schedule_staging_cleanup(path: std::path::PathBuf) {
    tokio::spawn(async move {
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %err, path = %path.display(), "failed to remove staging file after publish failure");
        }
    });
}

#[derive(Deserialize)]
pub struct VideoRequest {
    uuid_filename: String,
    quality: Option<u8>,
}

pub async fn create_video(
    state: web::Data<AppState>,
    body: web::Json<VideoRequest>,
) -> Result<HttpResponse> {
    let staging_file = staging_path_for(&state, &body.uuid_filename).await?;
    let quality = match body.quality {
        Some(q) => Some(VideoQuality::new(q).ok_or_else(|| {
            HttpError(AppError::Validation("quality must be between 40 and 100".into()))
        })?),
        None => None,
    };

    let id = JobId::new();
    let job = VideoJob {
        file_path: staging_file.clone(),
        new_id: id,
        quality,
    };

    if let Err(err) = state.video_producer.publish(&job).await {
        schedule_staging_cleanup(staging_file).await;
        return Err(err.into());
    }

    Ok(HttpResponse::Ok().json(UploadAccepted {
        id,
        file_url: format!(
            "{}/{}",
            state.config.app.base_url,
            state.layout.video_playlist_url_path(id)
        ),
    }))
}

#[derive(Deserialize)]
pub struct VideoResolutionsRequest {
    uuid_filename: String,
}

pub async fn create_video_resolutions(
    state: web::Data<AppState>,
    body: web::Json<VideoResolutionsRequest>,
) -> Result<HttpResponse> {
    let staging_file = staging_path_for(&state, &body.uuid_filename).await?;

    let id = JobId::new();
    let job = VideoResolutionsJob {
        file_path: staging_file.clone(),
        new_id: id,
        resolutions: VideoResolution::ALL.to_vec(),
    };

    if let Err(err) = state.video_resolutions_producer.publish(&job).await {
        schedule_staging_cleanup(staging_file).await;
        return Err(err.into());
    }

    Ok(HttpResponse::Ok().json(UploadAccepted {
        id,
        file_url: format!(
            "{}/{}",
            state.config.app.base_url,
            state.layout.video_dir_url_path(id)
        ),
    }))
}

#[derive(Deserialize)]
pub struct ImageRequest {
    uuid_filename: String,
}

pub async fn create_image(
    state: web::Data<AppState>,
    body: web::Json<ImageRequest>,
) -> Result<HttpResponse> {
    let staging_file = staging_path_for(&state, &body.uuid_filename).await?;
    let id = JobId::new();
    let job = ImageJob {
        file_path: staging_file.clone(),
        new_id: id,
    };

    if let Err(err) = state.image_producer.publish(&job).await {
        schedule_staging_cleanup(staging_file).await;
        return Err(err.into());
    }

    Ok(HttpResponse::Ok().json(UploadAccepted {
        id,
        file_url: format!(
            "{}/{}",
            state.config.app.base_url,
            state.layout.image_url_path(id)
        ),
    }))
}

#[derive(Deserialize)]
pub struct AudioRequest {
    uuid_filename: String,
    bitrate: Option<String>,
}

pub async fn create_audio(
    state: web::Data<AppState>,
    body: web::Json<AudioRequest>,
) -> Result<HttpResponse> {
    let staging_file = staging_path_for(&state, &body.uuid_filename).await?;
    let bitrate = match &body.bitrate {
        Some(raw) => Some(
            AudioBitrate::parse(raw)
                .ok_or_else(|| HttpError(AppError::Validation(format!("invalid bitrate {raw:?}"))))?,
        ),
        None => None,
    };

    let id = JobId::new();
    let job = AudioJob {
        file_path: staging_file.clone(),
        new_id: id,
        bitrate,
    };

    if let Err(err) = state.audio_producer.publish(&job).await {
        schedule_staging_cleanup(staging_file).await;
        return Err(err.into());
    }

    Ok(HttpResponse::Ok().json(UploadAccepted {
        id,
        file_url: format!(
            "{}/{}",
            state.config.app.base_url,
            state.layout.audio_url_path(id)
        ),
    }))
}
