//! Turns configuration into running parts: sinks, reporters, probes, monitors

use crate::Result;
use ledwatch_core::color::Palette;
use ledwatch_core::config::{ConsoleConfig, MonitorSpec, ProbeSpec, SinkConfig, StripConfig};
use ledwatch_core::monitor::Monitor;
use ledwatch_core::policy::{BinaryPolicy, ColorPolicy, GradientPolicy};
use ledwatch_core::probe::{Probe, ReachabilityProbe, TemperatureProbe};
use ledwatch_core::report::{ConsoleReporter, StatusReporter, TracingReporter};
use ledwatch_core::sink::{IndicatorSink, LogSink, MemorySink, RemoteSink};
use std::sync::Arc;
use tracing::debug;

/// Creates the probe for a configured monitor
pub trait ProbeFactory: Send + Sync {
    fn probe_for(&self, spec: &MonitorSpec) -> Result<Arc<dyn Probe>>;
}

/// Real probes: system `ping` / TCP connect and the thermal-zone sensor
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbes;

impl ProbeFactory for SystemProbes {
    fn probe_for(&self, spec: &MonitorSpec) -> Result<Arc<dyn Probe>> {
        let probe: Arc<dyn Probe> = match &spec.probe {
            ProbeSpec::Reachability {
                target,
                method,
                attempts,
                timeout,
            } => Arc::new(ReachabilityProbe::new(target.clone(), *method, *attempts, *timeout)),
            ProbeSpec::Temperature { sensor, .. } => {
                Arc::new(TemperatureProbe::new(sensor.clone()))
            }
        };
        Ok(probe)
    }
}

/// Color policy matching a monitor's probe kind
pub fn policy_for(spec: &MonitorSpec, palette: &Palette) -> Arc<dyn ColorPolicy> {
    match &spec.probe {
        ProbeSpec::Reachability { .. } => Arc::new(BinaryPolicy::new(*palette)),
        ProbeSpec::Temperature {
            low,
            high,
            max_brightness,
            ..
        } => Arc::new(GradientPolicy::new(*low, *high, *max_brightness)),
    }
}

/// Open the configured indicator sink.
///
/// Fails when the sink cannot be acquired (e.g. the remote LED server is not
/// reachable), which is a fatal startup error.
pub async fn open_sink(strip: &StripConfig) -> Result<Arc<dyn IndicatorSink>> {
    let sink: Arc<dyn IndicatorSink> = match &strip.sink {
        SinkConfig::Memory => Arc::new(MemorySink::new(strip.slots)),
        SinkConfig::Log => Arc::new(LogSink::new(strip.slots)),
        SinkConfig::Remote {
            address,
            timeout,
            brightness_percent,
        } => Arc::new(
            RemoteSink::connect(address.clone(), strip.slots, *timeout, *brightness_percent)
                .await?,
        ),
    };
    debug!("Opened {:?} sink with {} slots", strip.sink, strip.slots);
    Ok(sink)
}

/// Reporter for status lines
pub fn reporter_for(console: &ConsoleConfig) -> Arc<dyn StatusReporter> {
    if console.enabled {
        Arc::new(ConsoleReporter::new(console.ansi))
    } else {
        Arc::new(TracingReporter)
    }
}

/// Assemble a monitor for `spec`
pub fn build_monitor(
    spec: &MonitorSpec,
    palette: &Palette,
    probes: &dyn ProbeFactory,
    sink: Arc<dyn IndicatorSink>,
    reporter: Arc<dyn StatusReporter>,
) -> Result<Monitor> {
    let monitor = Monitor::builder()
        .name(spec.name.clone())
        .slot(spec.slot)
        .interval(spec.interval)
        .probe(probes.probe_for(spec)?)
        .policy(policy_for(spec, palette))
        .sink(sink)
        .reporter(reporter)
        .build()?;
    Ok(monitor)
}
