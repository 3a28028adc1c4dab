//! Notification sink port — outbound delivery to one home-automation hub.

use std::future::Future;

use karotz_domain::notify::{DeliveryOutcome, HomeAutomationTarget, NotificationEvent};

/// Delivers one event to one target.
///
/// Implementations never return an error: every failure mode (bad URL,
/// timeout, connection refused, non-2xx) is folded into a failed
/// [`DeliveryOutcome`]. The fan-out logs the outcome and drops the event —
/// at-most-once, best-effort.
pub trait NotificationSink: Send + Sync {
    /// Build the platform URL and perform the bounded-timeout HTTP call.
    fn deliver(
        &self,
        target: &HomeAutomationTarget,
        event: &NotificationEvent,
    ) -> impl Future<Output = DeliveryOutcome> + Send;
}
