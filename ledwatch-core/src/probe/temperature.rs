//! CPU temperature probe backed by the Linux thermal-zone interface

use super::{Probe, ProbeResult};
use crate::error::ProbeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Thermal zone exposing the SoC temperature on a Raspberry Pi
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reads the core temperature in degrees Celsius.
///
/// The sysfs file holds an integer in millidegrees.
#[derive(Debug, Clone)]
pub struct TemperatureProbe {
    path: PathBuf,
}

impl TemperatureProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current temperature
    pub async fn read_temperature(&self) -> Result<f64, ProbeError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProbeError::SensorRead {
                source_path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        parse_millidegrees(&raw)
    }
}

impl Default for TemperatureProbe {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE)
    }
}

fn parse_millidegrees(raw: &str) -> Result<f64, ProbeError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|milli| milli / 1000.0)
        .ok_or_else(|| ProbeError::InvalidReading {
            value: trimmed.to_string(),
        })
}

#[async_trait]
impl Probe for TemperatureProbe {
    fn kind(&self) -> &str {
        "temperature"
    }

    async fn probe(&self) -> Result<ProbeResult, ProbeError> {
        self.read_temperature().await.map(ProbeResult::Numeric)
    }
}
