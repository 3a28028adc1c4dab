//! Request handlers.

pub mod device;
pub mod rfid;
pub mod status;

/// Liveness probe; deliberately ignorant of hardware and hub health.
pub async fn health() -> &'static str {
    "ok"
}
