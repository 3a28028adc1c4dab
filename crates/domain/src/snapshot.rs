//! Persisted state snapshot used for crash recovery.

use serde::{Deserialize, Serialize};

use crate::action::{ActionMarker, ExclusionGroup};
use crate::rfid::RfidSession;

/// Point-in-time copy of the live marker table and RFID session.
///
/// Written through the `StateStore` port after every mutation and read back
/// once at startup. Staleness filtering happens on restore, not on save, so
/// the snapshot is always a faithful copy of what was live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// One entry per occupied exclusion group.
    pub markers: Vec<(ExclusionGroup, ActionMarker)>,
    /// The active RFID session, if any.
    pub session: Option<RfidSession>,
}

impl StateSnapshot {
    /// Whether nothing was in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.session.is_none()
    }
}
