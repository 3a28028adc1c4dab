//! # karotz-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HardwareGateway` — LED, ears, sound playback, audio capture
//!   - `StateStore` — persisted marker/session snapshot for crash recovery
//!   - `RecordingStore` — stored RFID recordings
//!   - `NotificationSink` — outbound home-automation delivery
//! - Provide the **lock manager** (exclusion-group arbitration, stale sweep)
//! - Provide the **action dispatcher** (validate → acquire → hardware → result)
//! - Provide the **RFID state machine** (record/playback sessions with cues)
//! - Provide the **notification fan-out** (fire-and-forget, per-target tasks)
//!
//! ## Dependency rule
//! Depends on `karotz-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod dispatcher;
pub mod lock_manager;
pub mod notifications;
pub mod ports;
pub mod rfid_machine;
