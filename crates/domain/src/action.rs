//! Actions, exclusion groups, markers, and the canonical action result.
//!
//! An *action* is a single hardware-affecting operation. Kinds that cannot
//! run at the same time share an *exclusion group*; the lock manager in the
//! `app` crate enforces at most one live [`ActionMarker`] per group.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::KarotzError;
use crate::id::RequestId;
use crate::time::Timestamp;

/// Kind of hardware-affecting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    LedSet,
    EarMove,
    SoundPlay,
    SoundStop,
    RfidRecord,
    RfidPlay,
}

impl ActionKind {
    /// The exclusion groups this kind occupies while running.
    ///
    /// `RfidPlay` occupies both the ears group (playback animates the ears)
    /// and the RFID group (one RFID session system-wide).
    #[must_use]
    pub fn groups(self) -> &'static [ExclusionGroup] {
        match self {
            Self::LedSet => &[],
            Self::EarMove => &[ExclusionGroup::Ears],
            Self::SoundPlay | Self::SoundStop => &[ExclusionGroup::Sound],
            Self::RfidRecord => &[ExclusionGroup::Rfid],
            Self::RfidPlay => &[ExclusionGroup::Ears, ExclusionGroup::Rfid],
        }
    }

    /// Whether this kind forcibly releases a marker of `other` instead of
    /// failing with `Busy`. Only `SoundStop` preempts `SoundPlay`.
    #[must_use]
    pub fn preempts(self, other: ActionKind) -> bool {
        matches!((self, other), (Self::SoundStop, Self::SoundPlay))
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LedSet => f.write_str("led_set"),
            Self::EarMove => f.write_str("ear_move"),
            Self::SoundPlay => f.write_str("sound_play"),
            Self::SoundStop => f.write_str("sound_stop"),
            Self::RfidRecord => f.write_str("rfid_record"),
            Self::RfidPlay => f.write_str("rfid_play"),
        }
    }
}

/// A set of action kinds that cannot be simultaneously active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionGroup {
    /// Sound playback and stop.
    Sound,
    /// Ear movement (including the animation driven by RFID playback).
    Ears,
    /// RFID record/playback sessions.
    Rfid,
}

impl ExclusionGroup {
    /// All groups, for iteration in sweeps and snapshots.
    pub const ALL: [ExclusionGroup; 3] = [Self::Sound, Self::Ears, Self::Rfid];
}

impl std::fmt::Display for ExclusionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sound => f.write_str("sound"),
            Self::Ears => f.write_str("ears"),
            Self::Rfid => f.write_str("rfid"),
        }
    }
}

/// Record that an action of a given kind is currently in progress.
///
/// Markers are created when an action begins and destroyed when it
/// completes, fails, or is preempted. A marker that outlives the staleness
/// window is considered left over from a crash and may be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMarker {
    pub kind: ActionKind,
    pub started_at: Timestamp,
    pub request_id: RequestId,
}

impl ActionMarker {
    /// Create a marker starting now.
    #[must_use]
    pub fn new(kind: ActionKind, request_id: RequestId) -> Self {
        Self {
            kind,
            started_at: crate::time::now(),
            request_id,
        }
    }

    /// Whether the marker is older than `window` at instant `now`.
    #[must_use]
    pub fn is_stale(&self, window: Duration, now: Timestamp) -> bool {
        (now - self.started_at)
            .to_std()
            .is_ok_and(|age| age >= window)
    }
}

/// Outcome code carried by an [`ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Ok = 0,
    Busy = 1,
    InvalidState = 2,
    NotFound = 3,
    HardwareError = 4,
    BadRequest = 5,
}

/// Structured outcome of a dispatched action.
///
/// Produced by the action dispatcher, consumed by the response formatter.
/// Every error is converted into one of these at the dispatcher boundary;
/// nothing propagates as an uncaught failure to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub code: ResultCode,
}

impl ActionResult {
    /// Successful outcome with a message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: ResultCode::Ok,
        }
    }

    /// Failed outcome with an explicit code.
    #[must_use]
    pub fn failed(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code,
        }
    }
}

impl From<KarotzError> for ActionResult {
    fn from(err: KarotzError) -> Self {
        match err {
            KarotzError::Busy(inner) => Self::failed(ResultCode::Busy, inner.to_string()),
            KarotzError::InvalidState(inner) => {
                Self::failed(ResultCode::InvalidState, inner.to_string())
            }
            KarotzError::NotFound(inner) => Self::failed(ResultCode::NotFound, inner.to_string()),
            KarotzError::Hardware(inner) => {
                Self::failed(ResultCode::HardwareError, inner.to_string())
            }
            KarotzError::Validation(inner) => {
                Self::failed(ResultCode::BadRequest, inner.to_string())
            }
        }
    }
}
