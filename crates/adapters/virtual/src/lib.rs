//! In-memory hardware gateway.
//!
//! Stands in for the bus daemon when the service runs without hardware
//! (development, CI, integration tests). Commands are journaled instead of
//! executed; failures can be scripted per command verb; playback completion
//! is either immediate or driven explicitly by the test.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use karotz_app::ports::HardwareGateway;
use karotz_domain::command::{EarGesture, LedPattern, SoundHandle, SoundSource, StopTarget};
use karotz_domain::error::HardwareError;

struct Inner {
    journal: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    playing: Mutex<HashMap<u64, Arc<Notify>>>,
    next_handle: AtomicU64,
    /// When set, `wait_sound` returns as soon as it is called.
    immediate_completion: bool,
}

/// Journal-backed [`HardwareGateway`] implementation.
#[derive(Clone)]
pub struct VirtualGateway {
    inner: Arc<Inner>,
}

impl VirtualGateway {
    /// Gateway whose playbacks complete immediately. This is what the
    /// daemon uses when configured to run without hardware.
    #[must_use]
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Gateway whose playbacks run until [`finish_sound`](Self::finish_sound)
    /// or a stop command. Meant for tests that exercise in-flight playback.
    #[must_use]
    pub fn manual() -> Self {
        Self::build(false)
    }

    fn build(immediate_completion: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                journal: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
                playing: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(1),
                immediate_completion,
            }),
        }
    }

    /// Every command received so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        lock(&self.inner.journal).clone()
    }

    /// Make every subsequent command with this verb fail.
    pub fn fail_command(&self, verb: &'static str) {
        lock(&self.inner.failing).insert(verb);
    }

    /// Let commands with this verb succeed again.
    pub fn heal_command(&self, verb: &'static str) {
        lock(&self.inner.failing).remove(verb);
    }

    /// Complete an in-flight playback, waking its `wait_sound` caller.
    pub fn finish_sound(&self, handle: SoundHandle) {
        if let Some(notify) = lock(&self.inner.playing).remove(&handle.0) {
            notify.notify_one();
        }
    }

    /// Handles of playbacks that have not completed yet.
    #[must_use]
    pub fn active_sounds(&self) -> Vec<SoundHandle> {
        let mut handles: Vec<_> = lock(&self.inner.playing)
            .keys()
            .copied()
            .map(SoundHandle)
            .collect();
        handles.sort_by_key(|h| h.0);
        handles
    }

    fn record(&self, verb: &'static str, line: String) -> Result<(), HardwareError> {
        lock(&self.inner.journal).push(line);
        if lock(&self.inner.failing).contains(verb) {
            Err(HardwareError::Failed {
                command: verb,
                detail: "scripted failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for VirtualGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HardwareGateway for VirtualGateway {
    async fn set_led(&self, pattern: LedPattern) -> Result<(), HardwareError> {
        let suffix = if pattern.pulse { " PULSE" } else { "" };
        self.record("LED", format!("LED {}{suffix}", pattern.color.to_hex()))
    }

    async fn move_ears(&self, gesture: EarGesture) -> Result<(), HardwareError> {
        self.record(
            "EARS",
            format!("EARS {}", gesture.as_str().to_ascii_uppercase()),
        )
    }

    async fn play_sound(&self, source: SoundSource) -> Result<SoundHandle, HardwareError> {
        let what = match &source {
            SoundSource::Library(id) => id.clone(),
            SoundSource::File(path) => path.display().to_string(),
        };
        self.record("PLAY", format!("PLAY {what}"))?;
        let handle = SoundHandle(self.inner.next_handle.fetch_add(1, Ordering::SeqCst));
        if !self.inner.immediate_completion {
            lock(&self.inner.playing).insert(handle.0, Arc::new(Notify::new()));
        }
        Ok(handle)
    }

    async fn wait_sound(&self, handle: SoundHandle) -> Result<(), HardwareError> {
        let notify = lock(&self.inner.playing).get(&handle.0).cloned();
        if let Some(notify) = notify {
            notify.notified().await;
        }
        Ok(())
    }

    async fn stop_sound(&self, target: StopTarget) -> Result<(), HardwareError> {
        match target {
            StopTarget::All => {
                self.record("STOP", "STOP ALL".to_string())?;
                for (_, notify) in lock(&self.inner.playing).drain() {
                    notify.notify_one();
                }
            }
            StopTarget::Handle(handle) => {
                self.record("STOP", format!("STOP {}", handle.0))?;
                self.finish_sound(handle);
            }
        }
        Ok(())
    }

    async fn start_capture(&self, dest: PathBuf) -> Result<(), HardwareError> {
        self.record("CAPTURE", format!("CAPTURE START {}", dest.display()))
    }

    async fn stop_capture(&self) -> Result<(), HardwareError> {
        self.record("CAPTURE", "CAPTURE STOP".to_string())
    }
}
