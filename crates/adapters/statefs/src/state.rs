//! JSON snapshot store with atomic replace.

use std::path::PathBuf;

use karotz_app::ports::{StateStore, StoreError};
use karotz_domain::snapshot::StateSnapshot;

/// Persists the marker/session snapshot as one JSON file.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place, so
/// readers only ever see a complete snapshot. A missing file loads as the
/// empty snapshot (first boot, or state dir wiped on purpose).
#[derive(Debug, Clone)]
pub struct FsStateStore {
    path: PathBuf,
}

impl FsStateStore {
    /// Store backed by `path`; the parent directory must exist.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl StateStore for FsStateStore {
    async fn save(&self, snapshot: StateSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| StoreError(err.to_string()))?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn load(&self) -> Result<StateSnapshot, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|err| StoreError(err.to_string()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(StateSnapshot::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
