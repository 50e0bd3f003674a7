//! In-memory bookkeeping for in-progress chunked uploads. One entry
//! per `chunkId`, tracking the next expected chunk index and cumulative
//! size so gaps, duplicates, and oversized uploads are rejected before any
//! further disk I/O.

use dashmap::DashMap;
use media_types::ChunkId;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct ChunkSession {
    pub media_type: media_types::MediaType,
    pub ext: String,
    pub dir: PathBuf,
    pub next_index: u32,
    pub bytes_so_far: u64,
    pub started_at: Instant,
}

#[derive(Default)]
pub struct ChunkStore {
    sessions: DashMap<ChunkId, ChunkSession>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChunkError {
    UnknownSession,
    OutOfOrder { expected: u32, got: u32 },
    AggregateTooLarge,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, chunk_id: ChunkId, session: ChunkSession) {
        self.sessions.insert(chunk_id, session);
    }

    /// Validates the next chunk's index and size against the session,
    /// advancing bookkeeping on success. Does not touch disk.
    pub fn accept_chunk(
        &self,
        chunk_id: ChunkId,
        index: u32,
        size: u64,
        max_aggregate: u64,
    ) -> Result<ChunkSession, ChunkError> {
        let mut entry = self
            .sessions
            .get_mut(&chunk_id)
            .ok_or(ChunkError::UnknownSession)?;

        if index != entry.next_index {
            return Err(ChunkError::OutOfOrder {
                expected: entry.next_index,
                got: index,
            });
        }

        let new_total = entry.bytes_so_far + size;
        if new_total > max_aggregate {
            return Err(ChunkError::AggregateTooLarge);
        }

        entry.bytes_so_far = new_total;
        entry.next_index += 1;
        Ok(entry.clone())
    }

    pub fn get(&self, chunk_id: &ChunkId) -> Option<ChunkSession> {
        self.sessions.get(chunk_id).map(|e| e.clone())
    }

    pub fn remove(&self, chunk_id: &ChunkId) -> Option<ChunkSession> {
        self.sessions.remove(chunk_id).map(|(_, v)| v)
    }

    /// Sessions older than `max_age` with no terminal `completed` call —
    /// used by the chunk-directory GC sweep to reclaim abandoned sessions.
    pub fn stale_sessions(&self, max_age: std::time::Duration) -> Vec<(ChunkId, ChunkSession)> {
        self.sessions
            .iter()
            .filter(|e| e.started_at.elapsed() > max_age)
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::MediaType;

    fn session() -> ChunkSession {
        ChunkSession {
            media_type: MediaType::Video,
            ext: "mp4".into(),
            dir: "uploadStorage/videos/x.mp4".into(),
            next_index: 1,
            bytes_so_far: 100,
            started_at: Instant::now(),
        }
    }

    #[test]
    fn rejects_out_of_order_chunk() {
        let store = ChunkStore::new();
        let id = ChunkId::new();
        store.start(id, session());
        let err = store.accept_chunk(id, 5, 10, 1_000_000).unwrap_err();
        assert_eq!(err, ChunkError::OutOfOrder { expected: 1, got: 5 });
    }

    #[test]
    fn rejects_aggregate_over_limit() {
        let store = ChunkStore::new();
        let id = ChunkId::new();
        store.start(id, session());
        let err = store.accept_chunk(id, 1, 1000, 500).unwrap_err();
        assert_eq!(err, ChunkError::AggregateTooLarge);
    }

    #[test]
    fn accepts_contiguous_chunk_and_advances() {
        let store = ChunkStore::new();
        let id = ChunkId::new();
        store.start(id, session());
        let updated = store.accept_chunk(id, 1, 50, 1_000_000).unwrap();
        assert_eq!(updated.next_index, 2);
        assert_eq!(updated.bytes_so_far, 150);
    }

    #[test]
    fn unknown_session_is_rejected() {
        let store = ChunkStore::new();
        let err = store.accept_chunk(ChunkId::new(), 0, 10, 100).unwrap_err();
        assert_eq!(err, ChunkError::UnknownSession);
    }
}
