//! Action dispatcher — validate, arbitrate, drive hardware, report.
//!
//! The dispatcher is the boundary where every device-action error becomes an
//! [`ActionResult`]; nothing below it leaks to the HTTP layer. Requests are
//! already typed (validation happens while parsing query parameters), so the
//! dispatcher's job is arbitration and hardware sequencing.

use std::sync::Arc;
use std::time::Duration;

use karotz_domain::action::{ActionKind, ActionResult};
use karotz_domain::command::{EarGesture, LedPattern, SoundSource, StopTarget};
use karotz_domain::error::{HardwareError, KarotzError};
use karotz_domain::id::RequestId;
use karotz_domain::notify::NotificationEvent;

use crate::lock_manager::{LockManager, LockToken};
use crate::notifications::NotificationFanout;
use crate::ports::{HardwareGateway, NotificationSink, StateStore};

/// A validated device-action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    SetLed(LedPattern),
    MoveEars(EarGesture),
    PlaySound(SoundSource),
    StopSound,
}

impl ActionRequest {
    /// The action kind used for lock arbitration.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SetLed(_) => ActionKind::LedSet,
            Self::MoveEars(_) => ActionKind::EarMove,
            Self::PlaySound(_) => ActionKind::SoundPlay,
            Self::StopSound => ActionKind::SoundStop,
        }
    }
}

/// Dispatches device actions under exclusion-group arbitration.
pub struct ActionDispatcher<H, S, N> {
    gateway: Arc<H>,
    locks: Arc<LockManager<S>>,
    fanout: NotificationFanout<N>,
    /// Upper bound on how long a completion watcher waits for playback.
    max_play: Duration,
}

impl<H, S, N> Clone for ActionDispatcher<H, S, N> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            locks: Arc::clone(&self.locks),
            fanout: self.fanout.clone(),
            max_play: self.max_play,
        }
    }
}

impl<H, S, N> ActionDispatcher<H, S, N>
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    N: NotificationSink + 'static,
{
    /// Wire a dispatcher over the gateway, lock manager, and fan-out.
    pub fn new(
        gateway: Arc<H>,
        locks: Arc<LockManager<S>>,
        fanout: NotificationFanout<N>,
        max_play: Duration,
    ) -> Self {
        Self {
            gateway,
            locks,
            fanout,
            max_play,
        }
    }

    /// The lock manager backing this dispatcher.
    #[must_use]
    pub fn locks(&self) -> &Arc<LockManager<S>> {
        &self.locks
    }

    /// Run one device action end to end.
    ///
    /// Acquires the action's exclusion groups (returning a `Busy` result
    /// without touching hardware on conflict), issues the gateway calls, and
    /// releases the marker on every exit path. For `SoundPlay` the marker is
    /// handed to a spawned completion watcher that releases it when playback
    /// ends and fires a `sound_finished` notification (fire-and-forget).
    #[tracing::instrument(skip(self, request), fields(kind = %request.kind()))]
    pub async fn dispatch(&self, request: ActionRequest) -> ActionResult {
        let kind = request.kind();
        let request_id = RequestId::new();
        let token = match self.locks.acquire(kind, request_id).await {
            Ok(token) => token,
            Err(busy) => {
                tracing::debug!(group = %busy.group, holder = %busy.holder, "action rejected");
                return ActionResult::from(KarotzError::Busy(busy));
            }
        };

        match request {
            ActionRequest::SetLed(pattern) => {
                let outcome = self.gateway.set_led(pattern).await;
                self.finish(token, outcome, "led updated").await
            }
            ActionRequest::MoveEars(gesture) => {
                let outcome = self.gateway.move_ears(gesture).await;
                self.finish(token, outcome, "ears moving").await
            }
            ActionRequest::StopSound => {
                let outcome = self.gateway.stop_sound(StopTarget::All).await;
                self.finish(token, outcome, "sound stopped").await
            }
            ActionRequest::PlaySound(source) => self.start_playback(token, source).await,
        }
    }

    /// Release the marker, then map the hardware outcome.
    async fn finish(
        &self,
        token: LockToken,
        outcome: Result<(), HardwareError>,
        ok_message: &str,
    ) -> ActionResult {
        self.locks.release(token).await;
        match outcome {
            Ok(()) => ActionResult::ok(ok_message),
            Err(err) => {
                tracing::warn!(error = %err, "hardware call failed");
                ActionResult::from(KarotzError::Hardware(err))
            }
        }
    }

    async fn start_playback(&self, token: LockToken, source: SoundSource) -> ActionResult {
        let handle = match self.gateway.play_sound(source).await {
            Ok(handle) => handle,
            Err(err) => {
                self.locks.release(token).await;
                tracing::warn!(error = %err, "failed to start playback");
                return ActionResult::from(KarotzError::Hardware(err));
            }
        };

        let gateway = Arc::clone(&self.gateway);
        let locks = Arc::clone(&self.locks);
        let fanout = self.fanout.clone();
        let max_play = self.max_play;
        tokio::spawn(async move {
            let waited = tokio::time::timeout(max_play, gateway.wait_sound(handle)).await;
            // release before notifying: the device is idle again either way
            let was_live = locks.release(token).await;
            match waited {
                Ok(Ok(())) => {
                    // a stop preempted this playback when the token is no
                    // longer live; that is a cancellation, not a completion
                    if was_live {
                        fanout
                            .dispatch(NotificationEvent::new("sound_finished").with("value", "on"));
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "sound completion wait failed");
                }
                Err(_) => {
                    tracing::warn!("playback outlived the watch window, marker released");
                }
            }
        });

        ActionResult::ok("sound playback started")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use karotz_domain::action::{ExclusionGroup, ResultCode};
    use karotz_domain::command::{LedColor, SoundHandle};
    use karotz_domain::notify::{DeliveryOutcome, HomeAutomationTarget, NotificationEvent, Platform};
    use karotz_domain::snapshot::StateSnapshot;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullStore;

    impl StateStore for NullStore {
        async fn save(&self, _snapshot: StateSnapshot) -> Result<(), StoreError> {
            Ok(())
        }
        async fn load(&self) -> Result<StateSnapshot, StoreError> {
            Ok(StateSnapshot::default())
        }
    }

    struct MockGateway {
        calls: Mutex<Vec<String>>,
        fail: bool,
        playback_done: tokio::sync::Notify,
    }

    impl MockGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail: false,
                playback_done: tokio::sync::Notify::new(),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
                playback_done: tokio::sync::Notify::new(),
            })
        }

        fn record(&self, call: impl Into<String>) -> Result<(), HardwareError> {
            self.calls.lock().unwrap().push(call.into());
            if self.fail {
                Err(HardwareError::Failed {
                    command: "MOCK",
                    detail: "simulated".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl HardwareGateway for Arc<MockGateway> {
        async fn set_led(&self, pattern: LedPattern) -> Result<(), HardwareError> {
            self.record(format!("led:{}", pattern.color.to_hex()))
        }
        async fn move_ears(&self, gesture: EarGesture) -> Result<(), HardwareError> {
            self.record(format!("ears:{}", gesture.as_str()))
        }
        async fn play_sound(&self, _source: SoundSource) -> Result<SoundHandle, HardwareError> {
            self.record("play")?;
            Ok(SoundHandle(1))
        }
        async fn wait_sound(&self, _handle: SoundHandle) -> Result<(), HardwareError> {
            self.playback_done.notified().await;
            Ok(())
        }
        async fn stop_sound(&self, _target: StopTarget) -> Result<(), HardwareError> {
            self.record("stop")
        }
        async fn start_capture(&self, _dest: PathBuf) -> Result<(), HardwareError> {
            self.record("capture:start")
        }
        async fn stop_capture(&self) -> Result<(), HardwareError> {
            self.record("capture:stop")
        }
    }

    struct CountingSink {
        events: Mutex<Vec<String>>,
    }

    impl NotificationSink for Arc<CountingSink> {
        async fn deliver(
            &self,
            target: &HomeAutomationTarget,
            event: &NotificationEvent,
        ) -> DeliveryOutcome {
            self.events.lock().unwrap().push(event.name.clone());
            DeliveryOutcome::delivered(target.name.clone(), 200)
        }
    }

    fn one_target() -> Vec<HomeAutomationTarget> {
        vec![HomeAutomationTarget {
            name: "hub".to_string(),
            platform: Platform::Vera,
            base_url: "http://hub.local".to_string(),
            credentials: None,
            device_id: "42".to_string(),
            events: Vec::new(),
        }]
    }

    #[allow(clippy::type_complexity)]
    fn dispatcher(
        gateway: Arc<MockGateway>,
    ) -> (
        ActionDispatcher<Arc<MockGateway>, NullStore, Arc<CountingSink>>,
        Arc<CountingSink>,
    ) {
        let sink = Arc::new(CountingSink {
            events: Mutex::new(Vec::new()),
        });
        let locks = Arc::new(LockManager::new(NullStore, Duration::from_secs(45)));
        let fanout = NotificationFanout::new(Arc::clone(&sink), one_target());
        (
            ActionDispatcher::new(
                Arc::new(gateway),
                locks,
                fanout,
                Duration::from_secs(5),
            ),
            sink,
        )
    }

    #[tokio::test]
    async fn should_set_led_and_succeed() {
        let gateway = MockGateway::new();
        let (dispatcher, _) = dispatcher(Arc::clone(&gateway));

        let result = dispatcher
            .dispatch(ActionRequest::SetLed(LedPattern::steady(LedColor::Green)))
            .await;

        assert!(result.success);
        assert_eq!(result.code, ResultCode::Ok);
        assert_eq!(gateway.calls.lock().unwrap().as_slice(), ["led:00FF00"]);
    }

    #[tokio::test]
    async fn should_map_hardware_failure_and_release_marker() {
        let gateway = MockGateway::failing();
        let (dispatcher, _) = dispatcher(Arc::clone(&gateway));

        let result = dispatcher
            .dispatch(ActionRequest::MoveEars(EarGesture::Wiggle))
            .await;
        assert!(!result.success);
        assert_eq!(result.code, ResultCode::HardwareError);

        // the ears group must be free again despite the failure
        assert!(
            dispatcher
                .locks()
                .holder(ExclusionGroup::Ears)
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_reject_second_sound_while_first_is_playing() {
        let gateway = MockGateway::new();
        let (dispatcher, _) = dispatcher(Arc::clone(&gateway));

        let first = dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;
        assert!(first.success);

        let second = dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("pop.mp3").unwrap(),
            ))
            .await;
        assert!(!second.success);
        assert_eq!(second.code, ResultCode::Busy);

        // hardware only ever saw one play
        assert_eq!(gateway.calls.lock().unwrap().as_slice(), ["play"]);
    }

    #[tokio::test]
    async fn should_let_stop_clear_an_active_playback() {
        let gateway = MockGateway::new();
        let (dispatcher, _) = dispatcher(Arc::clone(&gateway));

        dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;

        let stop = dispatcher.dispatch(ActionRequest::StopSound).await;
        assert!(stop.success);

        // group is free: a new playback can start immediately
        let replay = dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("pop.mp3").unwrap(),
            ))
            .await;
        assert!(replay.success);
    }

    #[tokio::test]
    async fn should_release_marker_and_notify_when_playback_finishes() {
        let gateway = MockGateway::new();
        let (dispatcher, sink) = dispatcher(Arc::clone(&gateway));

        dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;
        assert!(
            dispatcher
                .locks()
                .holder(ExclusionGroup::Sound)
                .is_some()
        );

        gateway.playback_done.notify_waiters();

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if sink.events.lock().unwrap().contains(&"sound_finished".to_string()) {
                    break;
                }
                gateway.playback_done.notify_waiters();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("completion notification should fire");

        assert!(
            dispatcher
                .locks()
                .holder(ExclusionGroup::Sound)
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_not_notify_completion_for_a_stopped_playback() {
        let gateway = MockGateway::new();
        let (dispatcher, sink) = dispatcher(Arc::clone(&gateway));

        dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;
        let stop = dispatcher.dispatch(ActionRequest::StopSound).await;
        assert!(stop.success);

        // let the watcher observe the end of playback and settle
        for _ in 0..20 {
            gateway.playback_done.notify_waiters();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(sink.events.lock().unwrap().is_empty());
    }

    struct SlowSink {
        delay: Duration,
    }

    impl NotificationSink for Arc<SlowSink> {
        async fn deliver(
            &self,
            target: &HomeAutomationTarget,
            _event: &NotificationEvent,
        ) -> DeliveryOutcome {
            tokio::time::sleep(self.delay).await;
            DeliveryOutcome::delivered(target.name.clone(), 200)
        }
    }

    #[tokio::test]
    async fn should_not_let_a_slow_notification_target_delay_actions() {
        let gateway = MockGateway::new();
        let sink = Arc::new(SlowSink {
            delay: Duration::from_secs(30),
        });
        let locks = Arc::new(LockManager::new(NullStore, Duration::from_secs(45)));
        let fanout = NotificationFanout::new(Arc::clone(&sink), one_target());
        let dispatcher =
            ActionDispatcher::new(Arc::new(Arc::clone(&gateway)), locks, fanout, Duration::from_secs(5));

        let started = std::time::Instant::now();
        let result = dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;
        assert!(result.success);

        // the marker clears as soon as playback ends, while the sink is
        // still asleep on its own task
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if dispatcher.locks().holder(ExclusionGroup::Sound).is_none() {
                    break;
                }
                gateway.playback_done.notify_waiters();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("completion must not wait on the notification sink");

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn should_not_touch_hardware_when_group_is_busy() {
        let gateway = MockGateway::new();
        let (dispatcher, _) = dispatcher(Arc::clone(&gateway));

        dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("bip.mp3").unwrap(),
            ))
            .await;
        let calls_before = gateway.calls.lock().unwrap().len();

        let busy = dispatcher
            .dispatch(ActionRequest::PlaySound(
                SoundSource::library("pop.mp3").unwrap(),
            ))
            .await;
        assert_eq!(busy.code, ResultCode::Busy);
        assert_eq!(gateway.calls.lock().unwrap().len(), calls_before);
    }
}
