//! Background staging-file cleanup, mirroring the transcode worker's
//! delete-file loop. The retry worker never removes artifact directories
//! itself — `prepare_output`/`cleanup_between_attempts` manage those
//! synchronously, since the retry loop must know the directory is gone
//! before its next attempt.

use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct DeleteWorkers {
    file_tx: mpsc::UnboundedSender<PathBuf>,
}

impl DeleteWorkers {
    pub fn spawn() -> Self {
        let (file_tx, mut file_rx) = mpsc::unbounded_channel::<PathBuf>();

        tokio::spawn(async move {
            while let Some(path) = file_rx.recv().await {
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(error = %err, path = %path.display(), "failed to remove staging file");
                    }
                }
            }
        });

        Self { file_tx }
    }

    pub fn delete_file(&self, path: PathBuf) {
        let _ = self.file_tx.send(path);
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
}
