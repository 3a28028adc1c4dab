//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`KarotzError`] via `#[from]` at the port boundaries. The action
//! dispatcher is the last line of defence: every variant is converted
//! into an [`ActionResult`](crate::action::ActionResult) there, so no
//! error ever propagates uncaught to the HTTP layer.

use crate::action::ExclusionGroup;

/// Top-level error for device-control operations.
#[derive(Debug, thiserror::Error)]
pub enum KarotzError {
    /// A conflicting action already holds the exclusion group.
    #[error("busy")]
    Busy(#[from] BusyError),

    /// A state-machine transition is not permitted from the current state.
    #[error("invalid state")]
    InvalidState(#[from] InvalidStateError),

    /// A referenced resource (RFID recording, sound file) does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A hardware gateway call failed or timed out.
    #[error("hardware error")]
    Hardware(#[from] HardwareError),

    /// Request parameters failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),
}

/// An incompatible action currently holds an exclusion group.
#[derive(Debug, thiserror::Error)]
#[error("action group {group} is busy ({holder})")]
pub struct BusyError {
    /// The contended group.
    pub group: ExclusionGroup,
    /// Human-readable description of the current holder.
    pub holder: String,
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, thiserror::Error)]
#[error("invalid state: expected {expected}, got {actual}")]
pub struct InvalidStateError {
    pub expected: &'static str,
    pub actual: String,
}

/// A referenced resource does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// Kind of resource (e.g. "recording").
    pub entity: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}

/// Failure of a hardware command gateway call.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The gateway did not answer within the configured timeout.
    #[error("hardware call `{command}` timed out")]
    Timeout { command: &'static str },

    /// The gateway answered with an error.
    #[error("hardware call `{command}` failed: {detail}")]
    Failed {
        command: &'static str,
        detail: String,
    },
}

/// Request parameter validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// LED color is neither a palette name nor a 6-digit hex triple.
    #[error("unknown LED color `{0}`")]
    UnknownColor(String),

    /// Ear gesture name is not in the fixed set.
    #[error("unknown ear gesture `{0}`")]
    UnknownGesture(String),

    /// RFID tag identifier is empty or malformed.
    #[error("invalid RFID tag id")]
    InvalidTag,

    /// A required query parameter is missing.
    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),

    /// Sound source is neither a library id nor a path.
    #[error("invalid sound source `{0}`")]
    InvalidSound(String),
}
