//! Recording store port — audio recordings keyed by RFID tag.

use std::future::Future;
use std::path::PathBuf;

use karotz_domain::rfid::TagId;

use super::state_store::StoreError;

/// Storage for per-tag audio recordings.
///
/// Capture writes into a staging path; `commit` publishes it under the tag
/// with an atomic rename, so a crash mid-recording never corrupts an
/// existing recording for the same tag.
pub trait RecordingStore: Send + Sync {
    /// Where an in-progress capture for `tag` should be written.
    fn staging_path(&self, tag: &TagId) -> PathBuf;

    /// The stored recording for `tag`, or `None` when the tag has none.
    fn lookup(&self, tag: &TagId) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Publish the staged capture as the recording for `tag`.
    fn commit(&self, tag: &TagId) -> impl Future<Output = Result<PathBuf, StoreError>> + Send;

    /// Drop a staged capture that will not be committed.
    fn discard(&self, tag: &TagId) -> impl Future<Output = ()> + Send;
}
