//! Two background tasks performing best-effort asynchronous cleanup: one
//! drains a channel of staging files to remove, the other a channel of
//! artifact directories to remove recursively. Both log-and-continue on
//! failure rather than propagate, since cleanup is never on a job's
//! success/failure critical path.

use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct DeleteWorkers {
    file_tx: mpsc::UnboundedSender<PathBuf>,
    dir_tx: mpsc::UnboundedSender<PathBuf>,
}

impl DeleteWorkers {
    /// Spawns the file- and directory-deletion loops, returning a handle
    /// to enqueue work. The loops run until their channel senders are
    /// dropped.
    pub fn spawn() -> Self {
        let (file_tx, mut file_rx) = mpsc::unbounded_channel::<PathBuf>();
        let (dir_tx, mut dir_rx) = mpsc::unbounded_channel::<PathBuf>();

        tokio::spawn(async move {
            while let Some(path) = file_rx.recv().await {
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(error = %err, path = %path.display(), "failed to remove staging file");
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(path) = dir_rx.recv().await {
                if let Err(err) = tokio::fs::remove_dir_all(&path).await {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(error = %err, path = %path.display(), "failed to remove artifact directory");
                    }
                }
            }
        });

        Self { file_tx, dir_tx }
    }

    pub fn delete_file(&self, path: PathBuf) {
        let _ = self.file_tx.send(path);
    }

    pub fn delete_dir(&self, path: PathBuf) {
        let _ = self.dir_tx.send(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_file_eventually_removes_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("staged.mp4");
        tokio::fs::write(&file, b"x").await.unwrap();

        let workers = DeleteWorkers::spawn();
        workers.delete_file(file.clone());

        for _ in 0..50 {
            if tokio::fs::metadata(&file).await.is_err() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("file was not removed");
    }

    #[tokio::test]
    async fn delete_dir_eventually_removes_the_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_dir = dir.path().join("job-dir");
        tokio::fs::create_dir_all(&artifact_dir).await.unwrap();
        tokio::fs::write(artifact_dir.join("index.m3u8"), b"#EXTM3U\n")
            .await
            .unwrap();

        let workers = DeleteWorkers::spawn();
        workers.delete_dir(artifact_dir.clone());

        for _ in 0..50 {
            if tokio::fs::metadata(&artifact_dir).await.is_err() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("directory was not removed");
    }

    #[tokio::test]
    async fn deleting_a_missing_path_does_not_panic_the_worker() {
        let workers = DeleteWorkers::spawn();
        workers.delete_file(PathBuf::from("/nonexistent/path/does-not-exist"));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("still-works.txt");
        tokio::fs::write(&file, b"x").await.unwrap();
        workers.delete_file(file.clone());
        for _ in 0..50 {
            if tokio::fs::metadata(&file).await.is_err() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("worker loop stopped processing after the missing-path error");
    }
}
