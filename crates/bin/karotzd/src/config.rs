//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `karotzd.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use karotz_domain::notify::HomeAutomationTarget;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Hardware bus settings.
    pub hardware: HardwareConfig,
    /// Persistence settings.
    pub state: StateConfig,
    /// RFID session settings.
    pub rfid: RfidConfig,
    /// Home-automation notification settings.
    pub notify: NotifyConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// How to reach the hardware.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// `bus` for the real device, `virtual` for hardware-less operation.
    pub mode: HardwareMode,
    /// Unix socket of the bus daemon.
    pub socket_path: PathBuf,
    /// Directory resolved against library sound ids.
    pub sound_dir: PathBuf,
    /// Timeout for ordinary bus commands, in milliseconds.
    pub call_timeout_ms: u64,
    /// Upper bound on one sound playback, in seconds.
    pub play_watch_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareMode {
    #[default]
    Bus,
    Virtual,
}

/// Persistence locations and the marker staleness window.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the snapshot file and RFID recordings.
    pub data_dir: PathBuf,
    /// Age at which an action marker is considered abandoned, in seconds.
    pub staleness_secs: u64,
    /// How often the background sweep runs, in seconds.
    pub sweep_interval_secs: u64,
}

/// RFID session limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RfidConfig {
    /// Recording length at which capture auto-stops, in seconds.
    pub max_record_secs: u64,
    /// Upper bound on one recording playback, in seconds.
    pub max_play_secs: u64,
    /// Sound file played after a recording finishes playing back.
    pub completion_cue: Option<PathBuf>,
}

/// Outbound notification settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Per-delivery HTTP timeout, in seconds.
    pub timeout_secs: u64,
    /// Hubs to notify.
    pub targets: Vec<HomeAutomationTarget>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `karotzd.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("karotzd.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KAROTZD_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("KAROTZD_DATA_DIR") {
            self.state.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("KAROTZD_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.state.staleness_secs == 0 {
            return Err(ConfigError::Validation(
                "staleness window must be non-zero".to_string(),
            ));
        }
        if self.rfid.max_record_secs == 0 {
            return Err(ConfigError::Validation(
                "max recording length must be non-zero".to_string(),
            ));
        }
        for target in &self.notify.targets {
            if target.name.is_empty() {
                return Err(ConfigError::Validation(
                    "notification target name must not be empty".to_string(),
                ));
            }
            if target.device_id.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "notification target `{}` has an empty device id",
                    target.name
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.state.staleness_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.state.sweep_interval_secs)
    }

    #[must_use]
    pub fn play_watch(&self) -> Duration {
        Duration::from_secs(self.hardware.play_watch_secs)
    }

    #[must_use]
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            mode: HardwareMode::Bus,
            socket_path: PathBuf::from("/run/karotz/bus.sock"),
            sound_dir: PathBuf::from("/usr/share/karotzd/sounds"),
            call_timeout_ms: 2000,
            play_watch_secs: 600,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/karotzd"),
            staleness_secs: 45,
            sweep_interval_secs: 15,
        }
    }
}

impl Default for RfidConfig {
    fn default() -> Self {
        Self {
            max_record_secs: 30,
            max_play_secs: 120,
            completion_cue: None,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            targets: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "karotzd=info,karotz=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
