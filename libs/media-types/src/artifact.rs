use crate::ids::{ChunkId, JobId};
use crate::job::VideoResolution;
use std::path::{Path, PathBuf};

/// Resolves artifact and staging paths relative to configured roots.
/// Stateless — constructed once per process
/// and shared behind an `Arc` or `Clone`d freely (it only holds two
/// `PathBuf`s).
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    staging_root: PathBuf,
    artifact_root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(staging_root: impl Into<PathBuf>, artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
            artifact_root: artifact_root.into(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    // ---- staging (uploadStorage/) ----

    /// `uploadStorage/{type}s/{chunkId}.{ext}/` — holds `chunk_0..chunk_N`
    /// during an in-progress upload.
    pub fn chunk_dir(&self, type_plural: &str, chunk_id: ChunkId, ext: &str) -> PathBuf {
        self.staging_root
            .join(format!("{type_plural}s"))
            .join(format!("{chunk_id}.{ext}"))
    }

    pub fn chunk_file(&self, chunk_dir: &Path, index: u32) -> PathBuf {
        chunk_dir.join(format!("chunk_{index}"))
    }

    /// `uploadStorage/{chunkId}.{ext}` — the reassembled, encoder-ready input.
    pub fn staging_file(&self, chunk_id: ChunkId, ext: &str) -> PathBuf {
        self.staging_root.join(format!("{chunk_id}.{ext}"))
    }

    // ---- artifacts (media_docker_files/) ----

    pub fn image_path(&self, job_id: JobId) -> PathBuf {
        self.artifact_root
            .join("images")
            .join(format!("{job_id}.jpeg"))
    }

    pub fn audio_path(&self, job_id: JobId) -> PathBuf {
        self.artifact_root
            .join("audios")
            .join(format!("{job_id}.mp3"))
    }

    pub fn video_dir(&self, job_id: JobId) -> PathBuf {
        self.artifact_root.join("videos").join(job_id.to_string())
    }

    pub fn video_playlist(&self, job_id: JobId) -> PathBuf {
        self.video_dir(job_id).join("index.m3u8")
    }

    pub fn video_resolution_dir(&self, job_id: JobId, resolution: VideoResolution) -> PathBuf {
        self.video_dir(job_id).join(resolution.dir_name())
    }

    pub fn video_resolution_playlist(&self, job_id: JobId, resolution: VideoResolution) -> PathBuf {
        self.video_resolution_dir(job_id, resolution)
            .join("index.m3u8")
    }

    // ---- artifact URLs ----
    //
    // The read plane always mounts its static file service at the literal
    // path `media_docker_files`, regardless of what `artifact_root` points
    // at on disk (`ARTIFACT_ROOT` may be an absolute path elsewhere on the
    // filesystem). URLs returned to callers must use this fixed prefix, not
    // `artifact_root`, or they stop matching the served route.

    pub fn image_url_path(&self, job_id: JobId) -> String {
        format!("media_docker_files/images/{job_id}.jpeg")
    }

    pub fn audio_url_path(&self, job_id: JobId) -> String {
        format!("media_docker_files/audios/{job_id}.mp3")
    }

    pub fn video_dir_url_path(&self, job_id: JobId) -> String {
        format!("media_docker_files/videos/{job_id}")
    }

    pub fn video_playlist_url_path(&self, job_id: JobId) -> String {
        format!("media_docker_files/videos/{job_id}/index.m3u8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("uploadStorage", "media_docker_files")
    }

    #[test]
    fn image_path_matches_spec_layout() {
        let l = layout();
        let id = JobId::new();
        let p = l.image_path(id);
        assert_eq!(
            p,
            PathBuf::from(format!("media_docker_files/images/{id}.jpeg"))
        );
    }

    #[test]
    fn video_resolution_playlist_nests_under_job_dir() {
        let l = layout();
        let id = JobId::new();
        let p = l.video_resolution_playlist(id, VideoResolution::P720);
        assert_eq!(
            p,
            PathBuf::from(format!(
                "media_docker_files/videos/{id}/720/index.m3u8"
            ))
        );
    }

    #[test]
    fn image_url_path_ignores_artifact_root() {
        let l = ArtifactLayout::new("uploadStorage", "/var/data/artifacts");
        let id = JobId::new();
        assert_eq!(l.image_url_path(id), format!("media_docker_files/images/{id}.jpeg"));
    }

    #[test]
    fn chunk_dir_nests_under_typed_plural() {
        let l = layout();
        let chunk_id = ChunkId::new();
        let p = l.chunk_dir("video", chunk_id, "mp4");
        assert_eq!(
            p,
            PathBuf::from(format!("uploadStorage/videos/{chunk_id}.mp4"))
        );
    }
}
