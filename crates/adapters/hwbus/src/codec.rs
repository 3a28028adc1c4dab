//! Line encoding for bus commands and decoding of replies.

use std::path::Path;

use karotz_domain::command::{EarGesture, LedPattern, SoundHandle, StopTarget};
use karotz_domain::error::HardwareError;

/// `LED <RRGGBB> [PULSE]`
#[must_use]
pub fn led(pattern: &LedPattern) -> String {
    if pattern.pulse {
        format!("LED {} PULSE", pattern.color.to_hex())
    } else {
        format!("LED {}", pattern.color.to_hex())
    }
}

/// `EARS <GESTURE>`
#[must_use]
pub fn ears(gesture: EarGesture) -> String {
    format!("EARS {}", gesture.as_str().to_ascii_uppercase())
}

/// `PLAY <path>`
#[must_use]
pub fn play(path: &Path) -> String {
    format!("PLAY {}", path.display())
}

/// `WAIT <handle>`
#[must_use]
pub fn wait(handle: SoundHandle) -> String {
    format!("WAIT {}", handle.0)
}

/// `STOP ALL` or `STOP <handle>`
#[must_use]
pub fn stop(target: StopTarget) -> String {
    match target {
        StopTarget::All => "STOP ALL".to_string(),
        StopTarget::Handle(handle) => format!("STOP {}", handle.0),
    }
}

/// `CAPTURE START <path>`
#[must_use]
pub fn capture_start(dest: &Path) -> String {
    format!("CAPTURE START {}", dest.display())
}

/// `CAPTURE STOP`
#[must_use]
pub fn capture_stop() -> String {
    "CAPTURE STOP".to_string()
}

/// Decode one reply line into its `OK` payload.
///
/// # Errors
///
/// Returns [`HardwareError::Failed`] for `ERR <detail>` replies and for
/// anything that is not a well-formed reply line.
pub fn decode_reply(command: &'static str, reply: &str) -> Result<String, HardwareError> {
    if reply == "OK" {
        return Ok(String::new());
    }
    if let Some(data) = reply.strip_prefix("OK ") {
        return Ok(data.to_string());
    }
    if let Some(detail) = reply.strip_prefix("ERR ") {
        return Err(HardwareError::Failed {
            command,
            detail: detail.to_string(),
        });
    }
    Err(HardwareError::Failed {
        command,
        detail: format!("unexpected reply `{reply}`"),
    })
}

/// Decode the handle returned by a `PLAY` command.
///
/// # Errors
///
/// Returns [`HardwareError::Failed`] when the payload is not an integer.
pub fn decode_handle(data: &str) -> Result<SoundHandle, HardwareError> {
    data.parse::<u64>()
        .map(SoundHandle)
        .map_err(|_| HardwareError::Failed {
            command: "PLAY",
            detail: format!("unparsable handle `{data}`"),
        })
}
