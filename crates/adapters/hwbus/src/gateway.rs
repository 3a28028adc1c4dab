//! Unix-socket implementation of the hardware gateway port.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use karotz_app::ports::HardwareGateway;
use karotz_domain::command::{EarGesture, LedPattern, SoundHandle, SoundSource, StopTarget};
use karotz_domain::error::HardwareError;

use crate::codec;

/// Connection settings for the bus socket.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub socket_path: PathBuf,
    /// Directory resolved against library sound ids.
    pub sound_dir: PathBuf,
    /// Timeout for ordinary commands.
    pub call_timeout: Duration,
    /// Timeout for `WAIT`, which legitimately blocks for a whole playback.
    pub wait_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/karotz/bus.sock"),
            sound_dir: PathBuf::from("/usr/share/karotzd/sounds"),
            call_timeout: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(600),
        }
    }
}

/// Talks to the bus daemon, one connection per command.
#[derive(Debug, Clone)]
pub struct BusGateway {
    config: BusConfig,
}

impl BusGateway {
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }

    /// Send one line and decode the single reply line, under `timeout`.
    async fn round_trip(
        &self,
        command: &'static str,
        line: String,
        timeout: Duration,
    ) -> Result<String, HardwareError> {
        tracing::debug!(command, "bus call");
        match tokio::time::timeout(timeout, self.exchange(line)).await {
            Ok(Ok(reply)) => codec::decode_reply(command, &reply),
            Ok(Err(err)) => Err(HardwareError::Failed {
                command,
                detail: err.to_string(),
            }),
            Err(_) => Err(HardwareError::Timeout { command }),
        }
    }

    async fn exchange(&self, line: String) -> std::io::Result<String> {
        let stream = UnixStream::connect(&self.config.socket_path).await?;
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(line.as_bytes()).await?;
        stream.get_mut().write_all(b"\n").await?;
        let mut reply = String::new();
        stream.read_line(&mut reply).await?;
        Ok(reply.trim_end().to_string())
    }

    fn resolve(&self, source: SoundSource) -> PathBuf {
        match source {
            SoundSource::Library(id) => self.config.sound_dir.join(id),
            SoundSource::File(path) => path,
        }
    }
}

impl HardwareGateway for BusGateway {
    async fn set_led(&self, pattern: LedPattern) -> Result<(), HardwareError> {
        self.round_trip("LED", codec::led(&pattern), self.config.call_timeout)
            .await
            .map(|_| ())
    }

    async fn move_ears(&self, gesture: EarGesture) -> Result<(), HardwareError> {
        self.round_trip("EARS", codec::ears(gesture), self.config.call_timeout)
            .await
            .map(|_| ())
    }

    async fn play_sound(&self, source: SoundSource) -> Result<SoundHandle, HardwareError> {
        let path = self.resolve(source);
        let data = self
            .round_trip("PLAY", codec::play(&path), self.config.call_timeout)
            .await?;
        codec::decode_handle(&data)
    }

    async fn wait_sound(&self, handle: SoundHandle) -> Result<(), HardwareError> {
        self.round_trip("WAIT", codec::wait(handle), self.config.wait_timeout)
            .await
            .map(|_| ())
    }

    async fn stop_sound(&self, target: StopTarget) -> Result<(), HardwareError> {
        self.round_trip("STOP", codec::stop(target), self.config.call_timeout)
            .await
            .map(|_| ())
    }

    async fn start_capture(&self, dest: PathBuf) -> Result<(), HardwareError> {
        self.round_trip(
            "CAPTURE",
            codec::capture_start(&dest),
            self.config.call_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn stop_capture(&self) -> Result<(), HardwareError> {
        self.round_trip("CAPTURE", codec::capture_stop(), self.config.call_timeout)
            .await
            .map(|_| ())
    }
}
