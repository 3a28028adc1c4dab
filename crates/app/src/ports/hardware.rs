//! Hardware command gateway port — the bus that drives LEDs, ears, and audio.
//!
//! Every call is synchronous from the caller's point of view and bounded by
//! a timeout inside the adapter; a call that does not complete in time comes
//! back as [`HardwareError::Timeout`]. The gateway never blocks indefinitely.

use std::future::Future;
use std::path::PathBuf;

use karotz_domain::command::{EarGesture, LedPattern, SoundHandle, SoundSource, StopTarget};
use karotz_domain::error::HardwareError;

/// Command interface to the device hardware bus.
///
/// Implemented by the `hwbus` adapter (Unix-socket line protocol) and by the
/// `virtual` adapter (in-memory, for tests and hardware-less operation).
pub trait HardwareGateway: Send + Sync {
    /// Set the LED to a color, steady or pulsing.
    fn set_led(
        &self,
        pattern: LedPattern,
    ) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Run a named ear gesture.
    fn move_ears(
        &self,
        gesture: EarGesture,
    ) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Start playing a sound; returns once playback has begun.
    fn play_sound(
        &self,
        source: SoundSource,
    ) -> impl Future<Output = Result<SoundHandle, HardwareError>> + Send;

    /// Resolve when the given playback finishes naturally or is stopped.
    ///
    /// Used by completion watchers; callers bound it with their own timeout.
    fn wait_sound(
        &self,
        handle: SoundHandle,
    ) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Stop one playback, or all of them.
    fn stop_sound(
        &self,
        target: StopTarget,
    ) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Start capturing microphone audio into `dest`.
    fn start_capture(
        &self,
        dest: PathBuf,
    ) -> impl Future<Output = Result<(), HardwareError>> + Send;

    /// Stop the in-progress capture and flush the file.
    fn stop_capture(&self) -> impl Future<Output = Result<(), HardwareError>> + Send;
}
