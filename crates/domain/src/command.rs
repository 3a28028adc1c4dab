//! Value types for hardware commands: LED patterns, ear gestures, sounds.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed LED color palette, plus an explicit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColor {
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    Orange,
    White,
    Off,
    /// Explicit RGB triple parsed from a 6-digit hex string.
    Rgb(u8, u8, u8),
}

impl LedColor {
    /// Parse a palette name or a 6-digit hex triple (e.g. `FF6600`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownColor`] for anything else.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            "cyan" => Ok(Self::Cyan),
            "magenta" => Ok(Self::Magenta),
            "orange" => Ok(Self::Orange),
            "white" => Ok(Self::White),
            "off" | "black" => Ok(Self::Off),
            hex if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                let parse = |range| u8::from_str_radix(&hex[range], 16);
                match (parse(0..2), parse(2..4), parse(4..6)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Self::Rgb(r, g, b)),
                    _ => Err(ValidationError::UnknownColor(input.to_string())),
                }
            }
            _ => Err(ValidationError::UnknownColor(input.to_string())),
        }
    }

    /// The RGB triple for this color.
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (0xFF, 0, 0),
            Self::Green => (0, 0xFF, 0),
            Self::Blue => (0, 0, 0xFF),
            Self::Yellow => (0xFF, 0xFF, 0),
            Self::Cyan => (0, 0xFF, 0xFF),
            Self::Magenta => (0xFF, 0, 0xFF),
            Self::Orange => (0xFF, 0x66, 0),
            Self::White => (0xFF, 0xFF, 0xFF),
            Self::Off => (0, 0, 0),
            Self::Rgb(r, g, b) => (r, g, b),
        }
    }

    /// Uppercase 6-digit hex form, as written on the hardware bus.
    #[must_use]
    pub fn to_hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("{r:02X}{g:02X}{b:02X}")
    }
}

/// A complete LED instruction: color plus optional pulsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedPattern {
    pub color: LedColor,
    pub pulse: bool,
}

impl LedPattern {
    /// Steady light of the given color.
    #[must_use]
    pub fn steady(color: LedColor) -> Self {
        Self {
            color,
            pulse: false,
        }
    }

    /// Pulsing light of the given color.
    #[must_use]
    pub fn pulsing(color: LedColor) -> Self {
        Self { color, pulse: true }
    }
}

/// Named ear gesture from the fixed set the ear motors support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarGesture {
    Up,
    Down,
    Sad,
    Surprised,
    Wiggle,
}

impl EarGesture {
    /// Parse a gesture name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownGesture`] for names outside the set.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "sad" => Ok(Self::Sad),
            "surprised" => Ok(Self::Surprised),
            "wiggle" => Ok(Self::Wiggle),
            _ => Err(ValidationError::UnknownGesture(input.to_string())),
        }
    }

    /// Wire name of the gesture.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
            Self::Wiggle => "wiggle",
        }
    }
}

/// What to play: a library sound by id, or a file by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundSource {
    /// Identifier of a file in the sound library (no path separators).
    Library(String),
    /// Absolute path, used internally for RFID recordings and cue sounds.
    File(PathBuf),
}

impl SoundSource {
    /// Validate a library id coming from a caller.
    ///
    /// Rejects empty ids and anything containing path separators or parent
    /// references, so callers cannot escape the sound library directory.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSound`] on rejection.
    pub fn library(id: &str) -> Result<Self, ValidationError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ValidationError::InvalidSound(id.to_string()));
        }
        Ok(Self::Library(id.to_string()))
    }
}

/// Handle to an in-progress sound playback, issued by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundHandle(pub u64);

/// Target of a stop-sound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTarget {
    /// Stop every active playback.
    All,
    /// Stop one playback by handle.
    Handle(SoundHandle),
}
