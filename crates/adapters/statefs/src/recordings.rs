//! Per-tag recording files with staged commit.
//!
//! Layout under the recordings directory:
//! `<tag>.wav` is the published recording, `<tag>.wav.part` the staging
//! file a capture writes into. Commit is a rename, so re-recording a tag
//! either fully replaces the old recording or leaves it untouched.

use std::path::PathBuf;

use karotz_app::ports::{RecordingStore, StoreError};
use karotz_domain::rfid::TagId;

#[derive(Debug, Clone)]
pub struct FsRecordingStore {
    dir: PathBuf,
}

impl FsRecordingStore {
    /// Store rooted at `dir`; the directory must exist.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn final_path(&self, tag: &TagId) -> PathBuf {
        self.dir.join(format!("{tag}.wav"))
    }
}

impl RecordingStore for FsRecordingStore {
    fn staging_path(&self, tag: &TagId) -> PathBuf {
        self.dir.join(format!("{tag}.wav.part"))
    }

    async fn lookup(&self, tag: &TagId) -> Option<PathBuf> {
        let path = self.final_path(tag);
        tokio::fs::metadata(&path).await.is_ok().then_some(path)
    }

    async fn commit(&self, tag: &TagId) -> Result<PathBuf, StoreError> {
        let staged = self.staging_path(tag);
        let published = self.final_path(tag);
        tokio::fs::rename(&staged, &published).await?;
        Ok(published)
    }

    async fn discard(&self, tag: &TagId) {
        if let Err(err) = tokio::fs::remove_file(self.staging_path(tag)).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(tag = %tag, error = %err, "failed to discard staged capture");
            }
        }
    }
}
