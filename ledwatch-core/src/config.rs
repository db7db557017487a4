//! Configuration types for the ledwatch agent
//!
//! Configuration is read once at startup and never changes afterwards. The
//! defaults reproduce a typical Raspberry Pi deployment: an 8-slot strip, a
//! router reachability check on slot 5 and a CPU temperature gauge on slot 6.

use crate::color::Palette;
use crate::error::{LedwatchError, Result};
use crate::probe::{ReachabilityMethod, DEFAULT_THERMAL_ZONE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ledwatch.toml";

/// Environment variable pointing at an additional config file
pub const CONFIG_PATH_ENV: &str = "LEDWATCH_CONFIG_PATH";

/// Main configuration for the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Indicator strip
    #[serde(default)]
    pub strip: StripConfig,

    /// Colors used by reachability monitors
    #[serde(default)]
    pub palette: Palette,

    /// Console output of status lines
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Configured checks, one slot each
    #[serde(default = "default_monitors")]
    pub monitors: Vec<MonitorSpec>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            strip: StripConfig::default(),
            palette: Palette::default(),
            console: ConsoleConfig::default(),
            monitors: default_monitors(),
        }
    }
}

fn default_monitors() -> Vec<MonitorSpec> {
    vec![
        MonitorSpec {
            name: "network".to_string(),
            slot: 5,
            interval: Duration::from_secs(300),
            probe: ProbeSpec::Reachability {
                target: "192.168.10.1".to_string(),
                method: ReachabilityMethod::Ping,
                attempts: default_attempts(),
                timeout: default_probe_timeout(),
            },
        },
        MonitorSpec {
            name: "cpu".to_string(),
            slot: 6,
            interval: Duration::from_secs(60),
            probe: ProbeSpec::Temperature {
                sensor: default_sensor(),
                low: default_low(),
                high: default_high(),
                max_brightness: default_max_brightness(),
            },
        },
    ]
}

/// Indicator strip configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripConfig {
    /// Number of addressable slots
    #[serde(default = "default_slots")]
    pub slots: usize,

    /// Where colors are written
    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_slots() -> usize {
    8
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            sink: SinkConfig::default(),
        }
    }
}

/// Indicator sink backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// In-memory strip, no output
    Memory,

    /// In-memory strip that logs every change
    #[default]
    Log,

    /// Remote LED server speaking line-delimited JSON over TCP
    Remote {
        /// Server address (`host:port`)
        #[serde(default = "default_remote_address")]
        address: String,

        /// Connect and write timeout
        #[serde(default = "default_comms_timeout", with = "humantime_serde")]
        timeout: Duration,

        /// Global strip brightness, 0-100
        #[serde(default = "default_brightness_percent")]
        brightness_percent: u8,
    },
}

fn default_remote_address() -> String {
    "127.0.0.1:65434".to_string()
}

fn default_comms_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_brightness_percent() -> u8 {
    5
}

impl SinkConfig {
    /// Remote sink with the default server settings
    pub fn remote() -> Self {
        SinkConfig::Remote {
            address: default_remote_address(),
            timeout: default_comms_timeout(),
            brightness_percent: default_brightness_percent(),
        }
    }
}

/// Console output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Print status lines to stdout (otherwise they go to the log)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Color status lines with ANSI escapes
    #[serde(default = "default_true")]
    pub ansi: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ansi: true,
        }
    }
}

/// One configured check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSpec {
    /// Name used in logs and status lines
    pub name: String,

    /// Indicator slot owned by this monitor
    pub slot: usize,

    /// Polling interval
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Probe kind and its parameters
    #[serde(flatten)]
    pub probe: ProbeSpec,
}

/// Probe kind with probe-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeSpec {
    /// Network reachability, rendered with the binary palette
    Reachability {
        /// Host to check
        target: String,

        #[serde(default)]
        method: ReachabilityMethod,

        /// Echo requests or connection attempts per check
        #[serde(default = "default_attempts")]
        attempts: u32,

        /// Time budget for one check
        #[serde(default = "default_probe_timeout", with = "humantime_serde")]
        timeout: Duration,
    },

    /// CPU temperature, rendered as a green-to-red gradient
    Temperature {
        /// Thermal-zone file holding millidegrees
        #[serde(default = "default_sensor")]
        sensor: PathBuf,

        /// Readings at or below this are fully green
        #[serde(default = "default_low")]
        low: f64,

        /// Readings at or above this are fully red
        #[serde(default = "default_high")]
        high: f64,

        /// Channel intensity cap
        #[serde(default = "default_max_brightness")]
        max_brightness: u8,
    },
}

fn default_attempts() -> u32 {
    3
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_sensor() -> PathBuf {
    PathBuf::from(DEFAULT_THERMAL_ZONE)
}

fn default_low() -> f64 {
    60.0
}

fn default_high() -> f64 {
    80.0
}

fn default_max_brightness() -> u8 {
    10
}

impl AgentConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `ledwatch.toml` in the working directory
    /// 3. `LEDWATCH_`-prefixed environment variables (`__` separates nested
    ///    keys, e.g. `LEDWATCH_STRIP__SLOTS=16`)
    /// 4. The file named by `LEDWATCH_CONFIG_PATH`
    ///
    /// The result is validated before it is returned.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`AgentConfig::load`], with an explicit config file merged last.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist, a file is invalid, or the
    /// merged configuration fails validation.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(AgentConfig::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE))
            .merge(Env::prefixed("LEDWATCH_").ignore(&["CONFIG_PATH"]).split("__"));

        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
            figment = figment.merge(Toml::file(env_path));
        }

        if let Some(path) = path {
            if !path.exists() {
                return Err(LedwatchError::Configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: AgentConfig = figment.extract().map_err(|e| {
            LedwatchError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document on top of the defaults
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: AgentConfig = Figment::from(Serialized::defaults(AgentConfig::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| {
                LedwatchError::Configuration(format!("Failed to parse configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the startup invariants.
    ///
    /// Every monitor needs a unique name and a unique slot inside the strip,
    /// a non-zero interval, and sane probe parameters.
    pub fn validate(&self) -> Result<()> {
        if self.strip.slots == 0 {
            return Err(invalid("strip must have at least one slot"));
        }

        if let SinkConfig::Remote {
            address,
            timeout,
            brightness_percent,
        } = &self.strip.sink
        {
            if address.trim().is_empty() {
                return Err(invalid("remote sink address is empty"));
            }
            if timeout.is_zero() {
                return Err(invalid("remote sink timeout must be non-zero"));
            }
            if *brightness_percent > 100 {
                return Err(invalid(format!(
                    "brightness_percent must be 0-100, got {}",
                    brightness_percent
                )));
            }
        }

        if self.monitors.is_empty() {
            return Err(invalid("no monitors configured"));
        }

        let mut names: HashMap<&str, usize> = HashMap::new();
        let mut slots: HashMap<usize, &str> = HashMap::new();

        for spec in &self.monitors {
            if spec.name.trim().is_empty() {
                return Err(invalid(format!("monitor on slot {} has no name", spec.slot)));
            }
            if names.insert(spec.name.as_str(), spec.slot).is_some() {
                return Err(invalid(format!("duplicate monitor name '{}'", spec.name)));
            }

            if spec.slot >= self.strip.slots {
                return Err(LedwatchError::SlotOutOfRange {
                    monitor: spec.name.clone(),
                    slot: spec.slot,
                    len: self.strip.slots,
                });
            }
            if let Some(first) = slots.insert(spec.slot, spec.name.as_str()) {
                return Err(LedwatchError::DuplicateSlot {
                    slot: spec.slot,
                    first: first.to_string(),
                    second: spec.name.clone(),
                });
            }

            if spec.interval.is_zero() {
                return Err(invalid(format!("monitor '{}' has a zero interval", spec.name)));
            }

            spec.probe.validate(&spec.name)?;
        }

        Ok(())
    }

    /// Slots owned by configured monitors
    pub fn slots(&self) -> Vec<usize> {
        self.monitors.iter().map(|spec| spec.slot).collect()
    }
}

impl ProbeSpec {
    fn validate(&self, monitor: &str) -> Result<()> {
        match self {
            ProbeSpec::Reachability {
                target,
                attempts,
                timeout,
                ..
            } => {
                if target.trim().is_empty() {
                    return Err(invalid(format!("monitor '{}' has an empty target", monitor)));
                }
                if target.starts_with('-') {
                    return Err(invalid(format!(
                        "monitor '{}' has an invalid target '{}'",
                        monitor, target
                    )));
                }
                if *attempts == 0 {
                    return Err(invalid(format!(
                        "monitor '{}' needs at least one attempt",
                        monitor
                    )));
                }
                if timeout.is_zero() {
                    return Err(invalid(format!("monitor '{}' has a zero probe timeout", monitor)));
                }
            }
            ProbeSpec::Temperature { low, high, .. } => {
                if !low.is_finite() || !high.is_finite() || low >= high {
                    return Err(invalid(format!(
                        "monitor '{}' needs finite bounds with low < high (got {} and {})",
                        monitor, low, high
                    )));
                }
            }
        }
        Ok(())
    }

    /// Short probe label
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeSpec::Reachability { .. } => "reachability",
            ProbeSpec::Temperature { .. } => "temperature",
        }
    }
}

fn invalid(message: impl Into<String>) -> LedwatchError {
    LedwatchError::Configuration(message.into())
}
