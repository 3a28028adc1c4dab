//! RFID tags and record/playback sessions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::SessionId;
use crate::time::Timestamp;

/// Identifier of an RFID tag (e.g. `0123ABCD`).
///
/// Tag ids double as file-name stems for stored recordings, so only
/// alphanumeric characters, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Validate and wrap a tag identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTag`] when the id is empty, longer
    /// than 64 characters, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let valid = !input.is_empty()
            && input.len() <= 64
            && input
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(input.to_string()))
        } else {
            Err(ValidationError::InvalidTag)
        }
    }

    /// The raw tag id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mode of an active RFID session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfidMode {
    Recording,
    Playing,
}

impl std::fmt::Display for RfidMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recording => f.write_str("recording"),
            Self::Playing => f.write_str("playing"),
        }
    }
}

/// An in-progress record or playback bound to a tag.
///
/// Exactly one session may be active system-wide; its existence implies a
/// matching `RfidRecord`/`RfidPlay` marker (they are created and destroyed
/// together by the state machine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfidSession {
    pub id: SessionId,
    pub tag: TagId,
    pub mode: RfidMode,
    pub started_at: Timestamp,
    /// Recording destination or playback source.
    pub sound_path: PathBuf,
}

impl RfidSession {
    /// Start a session now.
    #[must_use]
    pub fn start(tag: TagId, mode: RfidMode, sound_path: PathBuf) -> Self {
        Self {
            id: SessionId::new(),
            tag,
            mode,
            started_at: crate::time::now(),
            sound_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_hex_style_tag_ids() {
        assert_eq!(TagId::parse("0123ABCD").unwrap().as_str(), "0123ABCD");
        assert!(TagId::parse("tag_blue-1").is_ok());
    }

    #[test]
    fn should_reject_empty_and_path_like_tag_ids() {
        assert!(TagId::parse("").is_err());
        assert!(TagId::parse("../boot").is_err());
        assert!(TagId::parse("a b").is_err());
        assert!(TagId::parse(&"x".repeat(65)).is_err());
    }

    #[test]
    fn should_roundtrip_session_through_serde_json() {
        let session = RfidSession::start(
            TagId::parse("0123ABCD").unwrap(),
            RfidMode::Recording,
            PathBuf::from("/var/lib/karotzd/rfid/0123ABCD.wav.part"),
        );
        let json = serde_json::to_string(&session).unwrap();
        let parsed: RfidSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }
}
