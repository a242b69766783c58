//! # Configuration
//!
//! YAML configuration for the simulator: tick loop, radio parameters,
//! emission queue, sink selection and logging.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `AISTX_CONFIG` environment variable
//! 2. `./aistx.yaml` (current directory)
//! 3. `~/.config/aistx/config.yaml` (user config)
//! 4. `/etc/aistx/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! simulation:
//!   tick_interval_s: 1.0
//!   duration_s: 600.0
//!   time_scale: 1.0
//!
//! radio:
//!   gmsk:
//!     samples_per_symbol: 8
//!     bt: 0.4
//!
//! sink:
//!   kind: sigmf
//!   path: "fleet"
//!
//! fleet_file: "fleet.json"
//! ```

use std::path::{Path, PathBuf};

use aistx_core::gmsk_modulator::GmskConfig;
use serde::{Deserialize, Serialize};

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    ReadError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),

    /// A fleet record failed boundary validation
    #[error("invalid vessel record {index}: {reason}")]
    InvalidVessel { index: usize, reason: String },
}

/// Tick loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per tick
    pub tick_interval_s: f64,
    /// Total simulated time; 0 runs until interrupted
    pub duration_s: f64,
    /// Wall-clock pacing (1 = real time, 0 = as fast as possible)
    pub time_scale: f64,
    /// Class A vessels with static data send Type 5 every N transmissions
    pub static_every: u32,
    /// Seed for the simulated UTC start and any randomized fields
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_s: 1.0,
            duration_s: 360.0,
            time_scale: 1.0,
            static_every: 6,
            seed: None,
        }
    }
}

/// Radio settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub gmsk: GmskConfig,
    /// TX gain handed to I/Q sinks, dB
    pub gain_db: f64,
}

/// Emission queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    /// Pending transmissions; the oldest is dropped when full
    pub queue_capacity: usize,
    /// Attempts after the first `SinkUnavailable`
    pub max_retries: u32,
    pub retry_interval_ms: u64,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_retries: 3,
            retry_interval_ms: 100,
        }
    }
}

/// Sink backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// SigMF recording of modulated bursts
    #[default]
    Sigmf,
    /// Bit-string lines to a file or stdout
    Bits,
    /// Bit-string lines to a TCP endpoint
    Tcp,
    /// In-memory, for dry runs
    Memory,
}

/// Sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Recording base name (sigmf) or output file (bits, "-" = stdout)
    pub path: String,
    /// `host:port` for the tcp sink
    pub address: String,
    pub connect_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Sigmf,
            path: "aistx".to_string(),
            address: "127.0.0.1:5000".to_string(),
            connect_timeout_ms: 1000,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable format
    #[default]
    Compact,
    /// Full format with all fields
    Full,
    /// JSON structured logging
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AistxConfig {
    pub version: String,
    pub simulation: SimulationConfig,
    pub radio: RadioConfig,
    pub emission: EmissionConfig,
    pub sink: SinkConfig,
    pub logging: LogConfig,
    /// JSON fleet file; relative paths resolve against the working directory
    pub fleet_file: String,
}

impl Default for AistxConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            simulation: SimulationConfig::default(),
            radio: RadioConfig::default(),
            emission: EmissionConfig::default(),
            sink: SinkConfig::default(),
            logging: LogConfig::default(),
            fleet_file: "fleet.json".to_string(),
        }
    }
}

impl AistxConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the defaults if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("AISTX_CONFIG") {
            let path = Path::new(&path);
            if path.exists() {
                return Self::load_from(path);
            }
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./aistx.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "aistx") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/aistx/config.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if !(sim.tick_interval_s.is_finite() && sim.tick_interval_s > 0.0) {
            return Err(ConfigError::ValidationError(
                "tick_interval_s must be positive".to_string(),
            ));
        }
        if sim.duration_s.is_nan() || sim.duration_s < 0.0 {
            return Err(ConfigError::ValidationError(
                "duration_s must not be negative".to_string(),
            ));
        }
        if sim.time_scale.is_nan() || sim.time_scale < 0.0 {
            return Err(ConfigError::ValidationError(
                "time_scale must not be negative".to_string(),
            ));
        }
        if sim.static_every == 0 {
            return Err(ConfigError::ValidationError(
                "static_every must be > 0".to_string(),
            ));
        }

        self.radio
            .gmsk
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.emission.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "queue_capacity must be > 0".to_string(),
            ));
        }

        match self.sink.kind {
            SinkKind::Sigmf if self.sink.path.is_empty() => {
                return Err(ConfigError::ValidationError(
                    "sigmf sink needs a path".to_string(),
                ));
            }
            SinkKind::Tcp if self.sink.address.is_empty() => {
                return Err(ConfigError::ValidationError(
                    "tcp sink needs an address".to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            simulation: SimulationConfig {
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
