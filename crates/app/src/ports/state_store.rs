//! State store port — persisted marker/session snapshot for crash recovery.

use std::future::Future;

use karotz_domain::snapshot::StateSnapshot;

/// Failure of a state or recording store operation.
///
/// Persistence failures never fail a device action; callers log and carry
/// on with the in-memory state as the source of truth.
#[derive(Debug, thiserror::Error)]
#[error("store failure: {0}")]
pub struct StoreError(pub String);

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

/// Persistence for the lock manager's snapshot.
///
/// `save` must replace the previous snapshot atomically so a crash mid-write
/// never leaves a torn file; `load` returns an empty snapshot when nothing
/// was ever saved.
pub trait StateStore: Send + Sync {
    /// Atomically replace the persisted snapshot.
    fn save(
        &self,
        snapshot: StateSnapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the last persisted snapshot.
    fn load(&self) -> impl Future<Output = Result<StateSnapshot, StoreError>> + Send;
}
