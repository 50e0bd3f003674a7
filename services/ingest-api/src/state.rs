use crate::chunk_store::ChunkStore;
use bus_adapter::{BusError, Producer};
use media_config::Config;
use media_types::{ArtifactLayout, AudioJob, DeleteFileJob, ImageJob, VideoJob, VideoResolutionsJob};

pub struct AppState {
    pub config: Config,
    pub layout: ArtifactLayout,
    pub chunks: ChunkStore,
    pub video_producer: Producer<VideoJob>,
    pub video_resolutions_producer: Producer<VideoResolutionsJob>,
    pub image_producer: Producer<ImageJob>,
    pub audio_producer: Producer<AudioJob>,
    pub delete_file_producer: Producer<DeleteFileJob>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BusError> {
        let layout = ArtifactLayout::new(
            config.storage.staging_root.clone(),
            config.storage.artifact_root.clone(),
        );
        let brokers = &config.kafka.brokers;
        let state = Self {
            video_producer: Producer::new(brokers, "video")?,
            video_resolutions_producer: Producer::new(brokers, "video-resolutions")?,
            image_producer: Producer::new(brokers, "image")?,
            audio_producer: Producer::new(brokers, "audio")?,
            delete_file_producer: Producer::new(brokers, "delete-file")?,
            layout,
            chunks: ChunkStore::new(),
            config,
        };
        Ok(state)
    }
}
