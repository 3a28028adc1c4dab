//! Fire-and-forget fan-out of notification events to configured targets.
//!
//! Each matching target gets its own spawned task, so one slow or dead hub
//! cannot delay another target — or the device-control caller, which never
//! waits on any of this.

use std::sync::Arc;

use karotz_domain::notify::{HomeAutomationTarget, NotificationEvent};

use crate::ports::NotificationSink;

/// Dispatches events to every subscribed [`HomeAutomationTarget`].
///
/// Cheap to clone; the target list is shared and immutable after startup.
pub struct NotificationFanout<N> {
    sink: Arc<N>,
    targets: Arc<[HomeAutomationTarget]>,
}

impl<N> Clone for NotificationFanout<N> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            targets: Arc::clone(&self.targets),
        }
    }
}

impl<N: NotificationSink + 'static> NotificationFanout<N> {
    /// Create a fan-out over the configured targets.
    pub fn new(sink: N, targets: Vec<HomeAutomationTarget>) -> Self {
        Self {
            sink: Arc::new(sink),
            targets: targets.into(),
        }
    }

    /// Notify every subscribed target on its own task and return
    /// immediately. Outcomes are logged; failures are dropped (no retry).
    pub fn dispatch(&self, event: NotificationEvent) {
        for (index, target) in self.targets.iter().enumerate() {
            if !target.subscribes_to(&event.name) {
                continue;
            }
            let sink = Arc::clone(&self.sink);
            let targets = Arc::clone(&self.targets);
            let event = event.clone();
            tokio::spawn(async move {
                let outcome = sink.deliver(&targets[index], &event).await;
                if outcome.success {
                    tracing::info!(
                        hub = %outcome.target,
                        event = %event.name,
                        status = outcome.status,
                        "notification delivered"
                    );
                } else {
                    tracing::warn!(
                        hub = %outcome.target,
                        event = %event.name,
                        status = outcome.status,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "notification delivery failed"
                    );
                }
            });
        }
    }

    /// How many targets subscribe to `event_name`.
    #[must_use]
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.targets
            .iter()
            .filter(|t| t.subscribes_to(event_name))
            .count()
    }
}
