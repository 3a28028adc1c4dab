//! RFID record/playback state machine.
//!
//! One session may be active system-wide. The machine pairs each session
//! with the lock token that reserved its exclusion groups, so the token is
//! always released by whoever ends the session (an explicit stop, the
//! auto-stop timer, or the playback completion watcher). Spawned timers and
//! watchers carry the generation they were armed for and act only if the
//! slot still holds that generation, so a stale timer can never cancel a
//! newer session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use karotz_domain::action::{ActionKind, ActionResult};
use karotz_domain::command::{EarGesture, LedColor, LedPattern, SoundSource, StopTarget};
use karotz_domain::error::{HardwareError, InvalidStateError, KarotzError, NotFoundError};
use karotz_domain::id::RequestId;
use karotz_domain::notify::NotificationEvent;
use karotz_domain::rfid::{RfidMode, RfidSession, TagId};

use crate::lock_manager::{LockManager, LockToken};
use crate::notifications::NotificationFanout;
use crate::ports::{HardwareGateway, NotificationSink, RecordingStore, StateStore};

/// Tunables for the RFID machine.
#[derive(Debug, Clone)]
pub struct RfidSettings {
    /// Recording length at which capture is stopped and committed as if the
    /// caller had asked.
    pub max_record: Duration,
    /// Upper bound on how long the watcher waits for playback to end.
    pub max_play: Duration,
    /// Sound played after a recording finishes playing back, if set.
    pub completion_cue: Option<PathBuf>,
}

impl Default for RfidSettings {
    fn default() -> Self {
        Self {
            max_record: Duration::from_secs(30),
            max_play: Duration::from_secs(120),
            completion_cue: None,
        }
    }
}

struct ActiveSession {
    session: RfidSession,
    token: LockToken,
    generation: u64,
}

struct Inner<H, S, R, N> {
    gateway: Arc<H>,
    locks: Arc<LockManager<S>>,
    recordings: R,
    fanout: NotificationFanout<N>,
    slot: Mutex<Option<ActiveSession>>,
    generation: AtomicU64,
    settings: RfidSettings,
}

/// Drives RFID record and playback sessions.
pub struct RfidMachine<H, S, R, N> {
    inner: Arc<Inner<H, S, R, N>>,
}

impl<H, S, R, N> Clone for RfidMachine<H, S, R, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H, S, R, N> RfidMachine<H, S, R, N>
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    /// Wire a machine over the gateway, lock manager, recording store, and
    /// notification fan-out.
    pub fn new(
        gateway: Arc<H>,
        locks: Arc<LockManager<S>>,
        recordings: R,
        fanout: NotificationFanout<N>,
        settings: RfidSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                locks,
                recordings,
                fanout,
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                settings,
            }),
        }
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<RfidSession> {
        self.inner.locks.session()
    }

    /// Begin capturing audio for `tag`.
    ///
    /// Claims the RFID group, shows the pulsing recording cue on the LED,
    /// starts capture into a staging path, and arms the auto-stop timer.
    /// Hitting the maximum recording length stops and commits the capture
    /// exactly as an explicit stop would.
    pub async fn start_recording(&self, tag: TagId) -> ActionResult {
        let inner = &self.inner;
        let token = match inner
            .locks
            .acquire(ActionKind::RfidRecord, RequestId::new())
            .await
        {
            Ok(token) => token,
            Err(busy) => return ActionResult::from(KarotzError::Busy(busy)),
        };

        if let Err(err) = inner
            .gateway
            .set_led(LedPattern::pulsing(LedColor::Orange))
            .await
        {
            // cosmetic only, the capture itself decides success
            tracing::warn!(error = %err, "failed to show recording cue");
        }

        let staging = inner.recordings.staging_path(&tag);
        if let Err(err) = inner.gateway.start_capture(staging.clone()).await {
            inner.locks.release(token).await;
            tracing::warn!(tag = %tag, error = %err, "failed to start capture");
            return ActionResult::from(KarotzError::Hardware(err));
        }

        let session = RfidSession::start(tag.clone(), RfidMode::Recording, staging);
        inner.locks.set_session(Some(session.clone())).await;
        let generation = inner.arm(ActiveSession {
            session,
            token,
            generation: 0,
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.settings.max_record).await;
            if let Some(active) = inner.take_generation(generation) {
                tracing::info!(tag = %active.session.tag, "recording reached maximum length");
                inner.finish_recording(active).await;
            }
        });

        tracing::info!(tag = %tag, "recording started");
        ActionResult::ok("recording started")
    }

    /// Stop the capture running for `tag` and commit it.
    pub async fn stop_recording(&self, tag: &TagId) -> ActionResult {
        let taken = self.inner.take_matching(|active| {
            active.session.mode == RfidMode::Recording && active.session.tag == *tag
        });
        let Some(active) = taken else {
            return ActionResult::from(KarotzError::InvalidState(self.inner.wrong_state(
                "a recording in progress for this tag",
            )));
        };
        self.inner.finish_recording(active).await
    }

    /// Play back the stored recording for `tag`.
    ///
    /// Unknown tags are rejected before any hardware is touched. Playback
    /// claims the ears and RFID groups, animates the ears, and hands its
    /// lock token to a completion watcher.
    pub async fn start_playback(&self, tag: TagId) -> ActionResult {
        let inner = &self.inner;
        let Some(path) = inner.recordings.lookup(&tag).await else {
            return ActionResult::from(KarotzError::NotFound(NotFoundError {
                entity: "recording",
                id: tag.to_string(),
            }));
        };

        let token = match inner
            .locks
            .acquire(ActionKind::RfidPlay, RequestId::new())
            .await
        {
            Ok(token) => token,
            Err(busy) => return ActionResult::from(KarotzError::Busy(busy)),
        };

        let handle = match inner.gateway.play_sound(SoundSource::File(path.clone())).await {
            Ok(handle) => handle,
            Err(err) => {
                inner.locks.release(token).await;
                tracing::warn!(tag = %tag, error = %err, "failed to start rfid playback");
                return ActionResult::from(KarotzError::Hardware(err));
            }
        };

        if let Err(err) = inner.gateway.move_ears(EarGesture::Wiggle).await {
            tracing::warn!(error = %err, "ear animation failed");
        }

        let session = RfidSession::start(tag.clone(), RfidMode::Playing, path);
        inner.locks.set_session(Some(session.clone())).await;
        let generation = inner.arm(ActiveSession {
            session,
            token,
            generation: 0,
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let waited =
                tokio::time::timeout(inner.settings.max_play, inner.gateway.wait_sound(handle))
                    .await;
            let Some(active) = inner.take_generation(generation) else {
                // an explicit stop already ended the session
                return;
            };
            inner.locks.release(active.token).await;
            inner.locks.set_session(None).await;
            match waited {
                Ok(Ok(())) => {
                    inner.play_completion_cue().await;
                    inner.fanout.dispatch(
                        NotificationEvent::new("rfid_play_finished")
                            .with("tag", active.session.tag.as_str()),
                    );
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "rfid playback wait failed");
                }
                Err(_) => {
                    tracing::warn!("rfid playback outlived the watch window");
                }
            }
        });

        tracing::info!(tag = %tag, "rfid playback started");
        ActionResult::ok("rfid playback started")
    }

    /// Stop an in-progress RFID playback.
    pub async fn stop_playback(&self) -> ActionResult {
        let taken = self
            .inner
            .take_matching(|active| active.session.mode == RfidMode::Playing);
        let Some(active) = taken else {
            return ActionResult::from(KarotzError::InvalidState(
                self.inner.wrong_state("an rfid playback in progress"),
            ));
        };

        let stopped = self.inner.gateway.stop_sound(StopTarget::All).await;
        self.inner.locks.release(active.token).await;
        self.inner.locks.set_session(None).await;
        match stopped {
            Ok(()) => ActionResult::ok("rfid playback stopped"),
            Err(err) => {
                tracing::warn!(error = %err, "failed to stop rfid playback");
                ActionResult::from(KarotzError::Hardware(err))
            }
        }
    }
}

impl<H, S, R, N> Inner<H, S, R, N>
where
    H: HardwareGateway,
    S: StateStore,
    R: RecordingStore,
    N: NotificationSink + 'static,
{
    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new active session under a fresh generation.
    fn arm(&self, mut active: ActiveSession) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        active.generation = generation;
        *self.lock_slot() = Some(active);
        generation
    }

    /// Take the slot only if it still holds `generation`.
    fn take_generation(&self, generation: u64) -> Option<ActiveSession> {
        let mut slot = self.lock_slot();
        if slot.as_ref().is_some_and(|a| a.generation == generation) {
            slot.take()
        } else {
            None
        }
    }

    /// Take the slot only if the active session matches `predicate`.
    fn take_matching(&self, predicate: impl Fn(&ActiveSession) -> bool) -> Option<ActiveSession> {
        let mut slot = self.lock_slot();
        if slot.as_ref().is_some_and(predicate) {
            slot.take()
        } else {
            None
        }
    }

    fn wrong_state(&self, expected: &'static str) -> InvalidStateError {
        let actual = self
            .locks
            .session()
            .map_or_else(|| "idle".to_string(), |s| format!("{} {}", s.mode, s.tag));
        InvalidStateError { expected, actual }
    }

    /// Stop capture, commit or discard the staged file, and clear session
    /// state. Shared by the explicit stop and the auto-stop timer.
    async fn finish_recording(&self, active: ActiveSession) -> ActionResult {
        let tag = active.session.tag.clone();
        let committed = match self.gateway.stop_capture().await {
            Ok(()) => self.recordings.commit(&tag).await.map_err(|err| {
                HardwareError::Failed {
                    command: "commit_recording",
                    detail: err.to_string(),
                }
            }),
            Err(err) => {
                self.recordings.discard(&tag).await;
                Err(err)
            }
        };

        self.locks.release(active.token).await;
        self.locks.set_session(None).await;
        if let Err(err) = self.gateway.set_led(LedPattern::steady(LedColor::Off)).await {
            tracing::warn!(error = %err, "failed to clear recording cue");
        }

        match committed {
            Ok(path) => {
                tracing::info!(tag = %tag, path = %path.display(), "recording stored");
                self.fanout
                    .dispatch(NotificationEvent::new("rfid_recorded").with("tag", tag.as_str()));
                ActionResult::ok(format!("recording stored for tag {tag}"))
            }
            Err(err) => {
                tracing::warn!(tag = %tag, error = %err, "recording was not stored");
                ActionResult::from(KarotzError::Hardware(err))
            }
        }
    }

    async fn play_completion_cue(&self) {
        let Some(cue) = self.settings.completion_cue.clone() else {
            return;
        };
        if let Err(err) = self.gateway.play_sound(SoundSource::File(cue)).await {
            tracing::warn!(error = %err, "failed to play completion cue");
        }
    }
}
