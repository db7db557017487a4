//! Probes sample an external condition and return a result
//!
//! A probe is stateless from the monitor's point of view: each invocation
//! produces a fresh [`ProbeResult`] or a [`ProbeError`], and a failed
//! invocation never affects the next one.

mod reachability;
mod temperature;

pub use reachability::{ReachabilityMethod, ReachabilityProbe};
pub use temperature::{TemperatureProbe, DEFAULT_THERMAL_ZONE};

use crate::error::ProbeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single probe invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ProbeResult {
    /// Reachability checks: true when the target answered
    Boolean(bool),
    /// Numeric readings such as a temperature in degrees Celsius
    Numeric(f64),
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::Boolean(true) => write!(f, "OK"),
            ProbeResult::Boolean(false) => write!(f, "FAILED"),
            ProbeResult::Numeric(value) => write!(f, "{:.1}", value),
        }
    }
}

/// A named check invoked once per monitor cycle
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short label used in status lines (e.g. "ping", "temperature")
    fn kind(&self) -> &str;

    /// Run the check once
    async fn probe(&self) -> Result<ProbeResult, ProbeError>;
}
