//! Home-automation notification targets, events, and delivery outcomes.

use serde::{Deserialize, Serialize};

/// Supported home-automation platforms.
///
/// Each platform has its own URL scheme, query-parameter names, and
/// credential placement; the lookup table lives in the `homeauto` adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vera,
    Eedomus,
    Zibase,
    Calaos,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vera => f.write_str("vera"),
            Self::Eedomus => f.write_str("eedomus"),
            Self::Zibase => f.write_str("zibase"),
            Self::Calaos => f.write_str("calaos"),
        }
    }
}

/// Credential pair for an integration.
///
/// `Debug` is implemented manually so secrets never reach the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"***")
            .finish()
    }
}

/// One configured home-automation integration.
///
/// Loaded once at startup and never mutated afterwards; concurrent
/// notification dispatches only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAutomationTarget {
    /// Short name used in logs and delivery outcomes.
    pub name: String,
    pub platform: Platform,
    /// Base URL of the hub, e.g. `http://192.168.1.10:3480`.
    pub base_url: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Device or scene identifier on the remote hub.
    pub device_id: String,
    /// Event names this target subscribes to; empty means every event.
    #[serde(default)]
    pub events: Vec<String>,
}

impl HomeAutomationTarget {
    /// Whether this target should be notified of `event_name`.
    #[must_use]
    pub fn subscribes_to(&self, event_name: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == event_name)
    }
}

/// A device event forwarded to home-automation hubs.
///
/// Ephemeral: created per dispatch, dropped once every outbound call has
/// resolved or timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub name: String,
    /// Ordered key-value payload; order is preserved in built URLs.
    pub payload: Vec<(String, String)>,
}

impl NotificationEvent {
    /// Event with an empty payload.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Vec::new(),
        }
    }

    /// Append a payload entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.push((key.into(), value.into()));
        self
    }

    /// Look up a payload entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The value forwarded to the hub (`value` payload entry, default `1`).
    #[must_use]
    pub fn value(&self) -> &str {
        self.get("value").unwrap_or("1")
    }
}

/// Result of one notification delivery attempt.
///
/// Logged by the fan-out, never surfaced to the device-control caller and
/// never retried (at-most-once, best-effort).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Name of the target that was notified.
    pub target: String,
    pub success: bool,
    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
    /// Error detail for failed deliveries.
    pub error: Option<String>,
}

impl DeliveryOutcome {
    /// Successful delivery with the given status code.
    #[must_use]
    pub fn delivered(target: impl Into<String>, status: u16) -> Self {
        Self {
            target: target.into(),
            success: true,
            status: Some(status),
            error: None,
        }
    }

    /// Failed delivery (non-2xx, timeout, connection error, bad URL).
    #[must_use]
    pub fn failed(target: impl Into<String>, status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            success: false,
            status,
            error: Some(error.into()),
        }
    }
}
