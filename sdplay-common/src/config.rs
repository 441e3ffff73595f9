//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`SDPLAY_CHUNK_SAMPLES`, `SDPLAY_VOLUME`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the
//! compiled defaults are used. A TOML file that exists but cannot be
//! parsed is reported as [`Error::Config`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "SDPLAY_CONFIG";
/// Environment variable overriding the chunk size in frames
pub const ENV_CHUNK_SAMPLES: &str = "SDPLAY_CHUNK_SAMPLES";
/// Environment variable overriding the output volume (0-255)
pub const ENV_VOLUME: &str = "SDPLAY_VOLUME";

/// Frames per chunk, about one second of audio at 16 kHz
pub const DEFAULT_CHUNK_SAMPLES: usize = 16384;
/// Device volume on the 0-255 scale
pub const DEFAULT_VOLUME: u8 = 200;
/// Sleep between busy polls of the sink
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Frames per chunk (also the capacity of each mono slot)
    #[serde(default = "default_chunk_samples")]
    pub chunk_samples: usize,

    /// Output volume, 0-255
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// Sleep between busy polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            chunk_samples: default_chunk_samples(),
            volume: default_volume(),
            poll_interval_ms: default_poll_interval_ms(),
            device: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_chunk_samples() -> usize {
    DEFAULT_CHUNK_SAMPLES
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config from a string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a TOML config from an existing file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file {:?}: {}", path, e);
            Error::Io(e)
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Load the config file located by [`locate_config_file`], or defaults
    /// if none exists
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match locate_config_file(explicit) {
            Some(path) => Self::load(&path),
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub chunk_samples: Option<usize>,
    pub volume: Option<u8>,
    pub poll_interval_ms: Option<u64>,
    pub device: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved player settings
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    pub chunk_samples: usize,
    pub volume: u8,
    pub poll_interval_ms: u64,
    pub device: Option<String>,
    pub log_level: String,
}

/// Resolve player settings: CLI > environment > TOML > defaults
pub fn resolve_settings(toml: &TomlConfig, cli: &ConfigOverrides) -> PlayerSettings {
    let chunk_samples = cli
        .chunk_samples
        .or_else(|| env_parse::<usize>(ENV_CHUNK_SAMPLES))
        .unwrap_or(toml.chunk_samples);

    let volume = cli
        .volume
        .or_else(|| env_parse::<u8>(ENV_VOLUME))
        .unwrap_or(toml.volume);

    let settings = PlayerSettings {
        chunk_samples,
        volume,
        poll_interval_ms: cli.poll_interval_ms.unwrap_or(toml.poll_interval_ms),
        device: cli.device.clone().or_else(|| toml.device.clone()),
        log_level: cli
            .log_level
            .clone()
            .unwrap_or_else(|| toml.logging.level.clone()),
    };

    debug!("Resolved player settings: {:?}", settings);
    settings
}

/// Read and parse an environment variable, ignoring unparsable values
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value {:?} for {}", raw, name);
            None
        }
    }
}

/// Find the config file to load
///
/// Order: explicit path, `SDPLAY_CONFIG`, user config dir, then
/// `/etc/sdplay/config.toml` on Linux. An explicit path is returned even if
/// it does not exist so that the caller reports the read failure.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("sdplay").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/sdplay/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
