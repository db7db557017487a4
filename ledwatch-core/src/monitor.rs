//! Periodic monitor: one probe, one color policy, one indicator slot
//!
//! A [`Monitor`] is assembled from injected parts and started with
//! [`Monitor::start`], which spawns its loop on the tokio runtime and returns
//! a [`MonitorHandle`]. Each cycle:
//!
//! 1. writes the policy's "checking" color, if it has one
//! 2. invokes the probe
//! 3. maps the result through the policy and writes the slot
//! 4. reports one status line
//! 5. sleeps for the polling interval
//!
//! The loop only ends when its cancellation token fires. Cancellation is
//! observed at the top of each cycle, after the probe returns, and during the
//! sleep; a probe already in flight runs to completion. Whatever the exit
//! path, including a panic inside the loop, the slot is cleared before the
//! task finishes.

use crate::color::Color;
use crate::error::{LedwatchError, ProbeError, Result};
use crate::policy::ColorPolicy;
use crate::probe::{Probe, ProbeResult};
use crate::report::{StatusLine, StatusOutcome, StatusReporter, TracingReporter};
use crate::sink::IndicatorSink;
use chrono::Local;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Latest known state of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum MonitorStatus {
    /// A probe is in flight
    Checking,
    /// The last reachability check succeeded
    Healthy,
    /// The last reachability check failed
    Unhealthy,
    /// The last numeric reading
    Reading(f64),
    /// The last probe errored or produced a result the policy cannot map
    Unknown,
    /// The loop crashed; the slot has been cleared
    Down,
    /// The loop exited after a stop request; the slot has been cleared
    Stopped,
}

impl MonitorStatus {
    fn from_result(result: &ProbeResult) -> Self {
        match result {
            ProbeResult::Boolean(true) => MonitorStatus::Healthy,
            ProbeResult::Boolean(false) => MonitorStatus::Unhealthy,
            ProbeResult::Numeric(value) => MonitorStatus::Reading(*value),
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Checking => write!(f, "checking"),
            MonitorStatus::Healthy => write!(f, "healthy"),
            MonitorStatus::Unhealthy => write!(f, "unhealthy"),
            MonitorStatus::Reading(value) => write!(f, "reading {:.1}", value),
            MonitorStatus::Unknown => write!(f, "unknown"),
            MonitorStatus::Down => write!(f, "down"),
            MonitorStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a monitor's task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    /// Stopped on request
    Stopped,
    /// The loop panicked; carries the panic message
    Crashed(String),
}

/// A periodic check bound to one indicator slot
pub struct Monitor {
    name: String,
    slot: usize,
    interval: Duration,
    probe: Arc<dyn Probe>,
    policy: Arc<dyn ColorPolicy>,
    sink: Arc<dyn IndicatorSink>,
    reporter: Arc<dyn StatusReporter>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("interval", &self.interval)
            .field("probe", &self.probe.kind())
            .finish()
    }
}

impl Monitor {
    /// Create a new monitor builder
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Spawn the monitor loop.
    ///
    /// The loop stops when `token` is cancelled, either directly or through a
    /// parent token. Must be called from within a tokio runtime.
    pub fn start(self, token: CancellationToken) -> MonitorHandle {
        let (status_tx, status_rx) = watch::channel(MonitorStatus::Checking);
        let name = self.name.clone();
        let slot = self.slot;
        let loop_token = token.clone();

        info!(
            "Starting monitor {} on slot {} (every {:?})",
            self.name, self.slot, self.interval
        );

        let join = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(self.run(&loop_token, &status_tx))
                .catch_unwind()
                .await;

            self.sink.clear(self.slot).await;

            match outcome {
                Ok(()) => {
                    status_tx.send_replace(MonitorStatus::Stopped);
                    info!("Monitor {} stopped, slot {} cleared", self.name, self.slot);
                    MonitorExit::Stopped
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    status_tx.send_replace(MonitorStatus::Down);
                    error!(
                        "Monitor {} crashed, slot {} cleared: {}",
                        self.name, self.slot, message
                    );
                    MonitorExit::Crashed(message)
                }
            }
        });

        MonitorHandle {
            name,
            slot,
            token,
            status: status_rx,
            join,
        }
    }

    async fn run(&self, token: &CancellationToken, status: &watch::Sender<MonitorStatus>) {
        loop {
            if token.is_cancelled() {
                break;
            }

            status.send_replace(MonitorStatus::Checking);
            if let Some(color) = self.policy.checking() {
                self.sink.set_pixel(self.slot, color).await;
            }

            let result = self.probe.probe().await;
            let checked_at = Local::now();

            if token.is_cancelled() {
                debug!("Monitor {} cancelled during probe", self.name);
                break;
            }

            let next = self.render(&result).await;
            status.send_replace(next);

            self.reporter.report(&StatusLine {
                monitor: self.name.clone(),
                kind: self.probe.kind().to_string(),
                slot: self.slot,
                checked_at,
                outcome: StatusOutcome::from(&result),
            });

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Write the color for a probe outcome and return the resulting status
    async fn render(
        &self,
        result: &std::result::Result<ProbeResult, ProbeError>,
    ) -> MonitorStatus {
        let (color, status) = match result {
            Ok(result) => match self.policy.color_for(result) {
                Some(color) => (Some(color), MonitorStatus::from_result(result)),
                None => {
                    warn!(
                        "Monitor {}: policy has no color for result {:?}",
                        self.name, result
                    );
                    (None, MonitorStatus::Unknown)
                }
            },
            Err(e) => {
                warn!("Monitor {} probe failed: {}", self.name, e);
                match self.policy.color_for_error() {
                    Some(color) => (Some(color), MonitorStatus::Unhealthy),
                    None => (None, MonitorStatus::Unknown),
                }
            }
        };

        self.write(color).await;
        status
    }

    async fn write(&self, color: Option<Color>) {
        match color {
            Some(color) => self.sink.set_pixel(self.slot, color).await,
            None => self.sink.clear(self.slot).await,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for [`Monitor`]
#[derive(Default)]
pub struct MonitorBuilder {
    name: Option<String>,
    slot: Option<usize>,
    interval: Option<Duration>,
    probe: Option<Arc<dyn Probe>>,
    policy: Option<Arc<dyn ColorPolicy>>,
    sink: Option<Arc<dyn IndicatorSink>>,
    reporter: Option<Arc<dyn StatusReporter>>,
}

impl MonitorBuilder {
    /// Set the monitor name used in logs and status lines
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the indicator slot this monitor owns
    pub fn slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Set the polling interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn ColorPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn IndicatorSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the status reporter (defaults to [`TracingReporter`])
    pub fn reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build the monitor
    pub fn build(self) -> Result<Monitor> {
        let name = self.name.ok_or_else(|| missing("name"))?;
        let slot = self.slot.ok_or_else(|| missing("slot"))?;
        let interval = self.interval.ok_or_else(|| missing("interval"))?;
        let probe = self.probe.ok_or_else(|| missing("probe"))?;
        let policy = self.policy.ok_or_else(|| missing("policy"))?;
        let sink = self.sink.ok_or_else(|| missing("sink"))?;

        if interval.is_zero() {
            return Err(LedwatchError::Configuration(format!(
                "Monitor {} has a zero polling interval",
                name
            )));
        }

        Ok(Monitor {
            name,
            slot,
            interval,
            probe,
            policy,
            sink,
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
        })
    }
}

fn missing(field: &str) -> LedwatchError {
    LedwatchError::Configuration(format!("Monitor {} is required", field))
}

/// Handle to a running monitor
#[derive(Debug)]
pub struct MonitorHandle {
    name: String,
    slot: usize,
    token: CancellationToken,
    status: watch::Receiver<MonitorStatus>,
    join: JoinHandle<MonitorExit>,
}

impl MonitorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Latest status
    pub fn status(&self) -> MonitorStatus {
        *self.status.borrow()
    }

    /// Receiver following every status change
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// True once the task has finished (stopped or crashed)
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Ask the loop to stop without waiting for it
    pub fn request_stop(&self) {
        self.token.cancel();
    }

    /// Stop the loop and wait until its slot has been cleared
    pub async fn stop(self) -> MonitorExit {
        self.token.cancel();
        self.join().await
    }

    /// Wait for the task to finish
    pub async fn join(self) -> MonitorExit {
        match self.join.await {
            Ok(exit) => exit,
            Err(e) => MonitorExit::Crashed(e.to_string()),
        }
    }
}
