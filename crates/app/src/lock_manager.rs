//! Exclusion-group arbitration for hardware actions.
//!
//! The lock manager is the single arbiter of "is an action of kind K
//! running". The in-memory marker table is the source of truth; a snapshot
//! is persisted through the [`StateStore`] port after every mutation so a
//! restart can recover, with markers older than the staleness window
//! discarded instead of wedging the device.
//!
//! All critical sections are synchronous and short (a std mutex over the
//! table); persistence happens outside the lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use karotz_domain::action::{ActionKind, ActionMarker, ExclusionGroup};
use karotz_domain::error::BusyError;
use karotz_domain::id::RequestId;
use karotz_domain::rfid::RfidSession;
use karotz_domain::snapshot::StateSnapshot;

use crate::ports::{StateStore, StoreError};

/// Proof of a successful [`LockManager::acquire`].
///
/// Not clonable; handing it back through [`LockManager::release`] is the
/// only way to clear the markers it covers. Releasing a token whose markers
/// were already replaced (stale sweep, preemption) is a no-op.
#[derive(Debug)]
pub struct LockToken {
    kind: ActionKind,
    request_id: RequestId,
}

impl LockToken {
    /// The action kind this token was issued for.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

#[derive(Default)]
struct LockState {
    markers: HashMap<ExclusionGroup, ActionMarker>,
    session: Option<RfidSession>,
}

impl LockState {
    fn snapshot(&self) -> StateSnapshot {
        let mut markers: Vec<_> = self
            .markers
            .iter()
            .map(|(group, marker)| (*group, marker.clone()))
            .collect();
        // stable order for byte-identical snapshots
        markers.sort_by_key(|(group, _)| ExclusionGroup::ALL.iter().position(|g| g == group));
        StateSnapshot {
            markers,
            session: self.session.clone(),
        }
    }
}

/// Tracks in-progress actions per exclusion group.
pub struct LockManager<S> {
    state: Mutex<LockState>,
    store: S,
    staleness: Duration,
}

impl<S: StateStore> LockManager<S> {
    /// Create a manager with an empty marker table.
    pub fn new(store: S, staleness: Duration) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            store,
            staleness,
        }
    }

    /// Load the persisted snapshot, dropping stale markers and any session
    /// left over from before the restart (its capture or playback died with
    /// the process; the markers it held expire through the normal window).
    ///
    /// # Errors
    ///
    /// Returns the store error when the snapshot cannot be read.
    pub async fn restore(&self) -> Result<(), StoreError> {
        let snapshot = self.store.load().await?;
        let now = karotz_domain::time::now();
        let mut dropped = 0usize;

        {
            let mut state = self.lock();
            for (group, marker) in snapshot.markers {
                if marker.is_stale(self.staleness, now) {
                    dropped += 1;
                } else {
                    state.markers.insert(group, marker);
                }
            }
            if snapshot.session.is_some() {
                tracing::info!("discarding rfid session interrupted by restart");
            }
        }

        if dropped > 0 {
            tracing::info!(dropped, "discarded stale markers on restore");
        }
        self.persist().await;
        Ok(())
    }

    /// Try to claim every exclusion group `kind` occupies.
    ///
    /// Stale markers count as free. A group held by a kind that `kind`
    /// preempts (`SoundStop` over `SoundPlay`) is forcibly cleared.
    ///
    /// # Errors
    ///
    /// Returns [`BusyError`] naming the first contended group; no marker is
    /// touched in that case.
    pub async fn acquire(
        &self,
        kind: ActionKind,
        request_id: RequestId,
    ) -> Result<LockToken, BusyError> {
        let now = karotz_domain::time::now();
        {
            let mut state = self.lock();
            for group in kind.groups() {
                if let Some(existing) = state.markers.get(group) {
                    let free = existing.is_stale(self.staleness, now) || kind.preempts(existing.kind);
                    if !free {
                        return Err(BusyError {
                            group: *group,
                            holder: existing.kind.to_string(),
                        });
                    }
                }
            }
            for group in kind.groups() {
                state
                    .markers
                    .insert(*group, ActionMarker::new(kind, request_id));
            }
        }
        self.persist().await;
        Ok(LockToken { kind, request_id })
    }

    /// Clear the markers belonging to `token`.
    ///
    /// Markers that no longer match the token's request id (replaced by a
    /// preempting action, or swept while the action ran long) are left
    /// alone. Returns `true` when the token still held at least one of its
    /// markers, `false` when it had been superseded; callers use this to
    /// tell a natural completion from a cancelled one.
    pub async fn release(&self, token: LockToken) -> bool {
        let live = {
            let mut state = self.lock();
            let mut live = false;
            for group in token.kind.groups() {
                let matches = state
                    .markers
                    .get(group)
                    .is_some_and(|m| m.request_id == token.request_id);
                if matches {
                    state.markers.remove(group);
                    live = true;
                }
            }
            live
        };
        self.persist().await;
        live
    }

    /// Unconditionally clear one group.
    pub async fn force_release(&self, group: ExclusionGroup) {
        let removed = self.lock().markers.remove(&group).is_some();
        if removed {
            self.persist().await;
        }
    }

    /// Drop markers older than the staleness window, plus any session whose
    /// RFID marker was dropped with them. Returns how many were removed.
    ///
    /// Safe to run concurrently with live acquire/release traffic.
    pub async fn sweep_stale(&self) -> usize {
        let now = karotz_domain::time::now();
        let removed = {
            let mut state = self.lock();
            let before = state.markers.len();
            state
                .markers
                .retain(|_, marker| !marker.is_stale(self.staleness, now));
            if state.session.is_some() && !state.markers.contains_key(&ExclusionGroup::Rfid) {
                state.session = None;
            }
            before - state.markers.len()
        };
        if removed > 0 {
            tracing::info!(removed, "swept stale action markers");
            self.persist().await;
        }
        removed
    }

    /// The marker currently holding `group`, if any.
    #[must_use]
    pub fn holder(&self, group: ExclusionGroup) -> Option<ActionMarker> {
        self.lock().markers.get(&group).cloned()
    }

    /// The active RFID session, if any.
    #[must_use]
    pub fn session(&self) -> Option<RfidSession> {
        self.lock().session.clone()
    }

    /// Replace the recorded RFID session and persist.
    pub async fn set_session(&self, session: Option<RfidSession>) {
        self.lock().session = session;
        self.persist().await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LockState> {
        // a poisoned lock means a panic while holding it; the table is
        // still structurally sound, so keep going with what is there
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn persist(&self) {
        let snapshot = self.lock().snapshot();
        if let Err(err) = self.store.save(snapshot).await {
            tracing::warn!(error = %err, "failed to persist marker snapshot");
        }
    }
}
