//! End-to-end supervisor tests against fake probes and an in-memory strip

use crate::{MonitorReport, ProbeFactory, Supervisor, SupervisorError};
use anyhow::anyhow;
use async_trait::async_trait;
use ledwatch_core::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone)]
enum Behavior {
    Fixed(ProbeResult),
    Panic,
}

struct FakeProbe(Behavior);

#[async_trait]
impl Probe for FakeProbe {
    fn kind(&self) -> &str {
        "fake"
    }

    async fn probe(&self) -> std::result::Result<ProbeResult, ProbeError> {
        match &self.0 {
            Behavior::Fixed(result) => Ok(*result),
            Behavior::Panic => panic!("fake probe exploded"),
        }
    }
}

// Probes by monitor name
#[derive(Default)]
struct FakeProbes(HashMap<String, Behavior>);

impl FakeProbes {
    fn with(mut self, name: &str, behavior: Behavior) -> Self {
        self.0.insert(name.to_string(), behavior);
        self
    }
}

impl ProbeFactory for FakeProbes {
    fn probe_for(&self, spec: &MonitorSpec) -> crate::Result<Arc<dyn Probe>> {
        let behavior = self
            .0
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| anyhow!("no fake probe for {}", spec.name))?;
        Ok(Arc::new(FakeProbe(behavior)))
    }
}

#[derive(Default)]
struct RecordingReporter {
    lines: Mutex<Vec<StatusLine>>,
}

impl StatusReporter for RecordingReporter {
    fn report(&self, line: &StatusLine) {
        self.lines.lock().unwrap().push(line.clone());
    }
}

fn reachability(name: &str, slot: usize) -> MonitorSpec {
    MonitorSpec {
        name: name.to_string(),
        slot,
        interval: TICK,
        probe: ProbeSpec::Reachability {
            target: "192.0.2.1".to_string(),
            method: ReachabilityMethod::Ping,
            attempts: 1,
            timeout: Duration::from_secs(1),
        },
    }
}

fn temperature(name: &str, slot: usize) -> MonitorSpec {
    MonitorSpec {
        name: name.to_string(),
        slot,
        interval: TICK,
        probe: ProbeSpec::Temperature {
            sensor: PathBuf::from("/nonexistent/temp"),
            low: 60.0,
            high: 80.0,
            max_brightness: 10,
        },
    }
}

fn config(monitors: Vec<MonitorSpec>) -> AgentConfig {
    AgentConfig {
        strip: StripConfig {
            slots: 8,
            sink: SinkConfig::Memory,
        },
        palette: Palette::default(),
        console: ConsoleConfig {
            enabled: false,
            ansi: false,
        },
        monitors,
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out waiting for strip state");
}

fn find<'a>(monitors: &'a [MonitorReport], name: &str) -> &'a MonitorReport {
    monitors
        .iter()
        .find(|report| report.name == name)
        .expect("monitor missing from report")
}

#[tokio::test]
async fn test_supervisor_renders_and_clears_on_shutdown() {
    let sink = Arc::new(MemorySink::new(8));
    let reporter = Arc::new(RecordingReporter::default());
    let probes = FakeProbes::default()
        .with("link", Behavior::Fixed(ProbeResult::Boolean(true)))
        .with("cpu", Behavior::Fixed(ProbeResult::Numeric(70.0)));

    let supervisor = Supervisor::with_parts(
        config(vec![reachability("link", 0), temperature("cpu", 1)]),
        sink.clone(),
        Arc::new(probes),
        reporter.clone(),
    )
    .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(supervisor.run(async {
        let _ = stop_rx.await;
    }));

    let healthy = Palette::default().healthy;
    wait_until(|| sink.get(0) == Some(healthy) && sink.get(1) == Some(Color::new(5, 5, 0))).await;

    stop_tx.send(()).unwrap();
    let report = timeout(WAIT, run).await.unwrap().unwrap().unwrap();

    assert!(sink.is_cleared(0));
    assert!(sink.is_cleared(1));
    for slot in 2..8 {
        assert!(sink.history(slot).is_empty(), "slot {} was written", slot);
    }

    assert_eq!(report.monitors.len(), 2);
    assert_eq!(report.crashed().count(), 0);
    for name in ["link", "cpu"] {
        let monitor = find(&report.monitors, name);
        assert_eq!(monitor.exit, MonitorExit::Stopped);
        assert_eq!(monitor.status, MonitorStatus::Stopped);
    }
    assert!(report.stopped_at >= report.started_at);

    let lines = reporter.lines.lock().unwrap();
    assert!(lines.iter().any(|line| line.monitor == "link" && !line.is_alert()));
    assert!(lines.iter().any(|line| line.monitor == "cpu" && line.slot == 1));
}

#[tokio::test]
async fn test_duplicate_slots_prevent_startup() {
    let sink = Arc::new(MemorySink::new(8));
    let probes = FakeProbes::default()
        .with("a", Behavior::Fixed(ProbeResult::Boolean(true)))
        .with("b", Behavior::Fixed(ProbeResult::Numeric(65.0)));

    let result = Supervisor::with_parts(
        config(vec![reachability("a", 5), temperature("b", 5)]),
        sink.clone(),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    );

    match result {
        Err(SupervisorError::Startup(LedwatchError::DuplicateSlot { slot, .. })) => {
            assert_eq!(slot, 5)
        }
        other => panic!("expected duplicate slot error, got {:?}", other),
    }
    assert!(sink.snapshot().iter().all(Option::is_none));
    assert!(sink.history(5).is_empty());
}

#[tokio::test]
async fn test_invalid_config_prevents_startup() {
    let mut bad = temperature("cpu", 1);
    bad.probe = ProbeSpec::Temperature {
        sensor: PathBuf::from("/nonexistent/temp"),
        low: 80.0,
        high: 60.0,
        max_brightness: 10,
    };

    let result = Supervisor::with_parts(
        config(vec![bad]),
        Arc::new(MemorySink::new(8)),
        Arc::new(FakeProbes::default()),
        Arc::new(RecordingReporter::default()),
    );

    assert!(matches!(
        result,
        Err(SupervisorError::Startup(LedwatchError::Configuration(_)))
    ));
}

#[tokio::test]
async fn test_slot_beyond_sink_prevents_startup() {
    let probes = FakeProbes::default().with("a", Behavior::Fixed(ProbeResult::Boolean(true)));

    let result = Supervisor::with_parts(
        config(vec![reachability("a", 5)]),
        Arc::new(MemorySink::new(2)),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    );

    assert!(matches!(
        result,
        Err(SupervisorError::Startup(LedwatchError::SlotOutOfRange { slot: 5, len: 2, .. }))
    ));
}

#[tokio::test]
async fn test_probe_build_failure_starts_nothing() {
    let sink = Arc::new(MemorySink::new(8));
    // "b" has no probe, so building it fails after "a" was built
    let probes = FakeProbes::default().with("a", Behavior::Fixed(ProbeResult::Boolean(true)));

    let supervisor = Supervisor::with_parts(
        config(vec![reachability("a", 0), reachability("b", 1)]),
        sink.clone(),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    )
    .unwrap();

    let result = supervisor.run(std::future::pending::<()>()).await;

    assert!(matches!(result, Err(SupervisorError::Other(_))));
    assert!(sink.history(0).is_empty());
    assert!(sink.history(1).is_empty());
}

#[tokio::test]
async fn test_crashed_monitor_does_not_affect_others() {
    let sink = Arc::new(MemorySink::new(8));
    let probes = FakeProbes::default()
        .with("good", Behavior::Fixed(ProbeResult::Boolean(true)))
        .with("bad", Behavior::Panic);

    let supervisor = Supervisor::with_parts(
        config(vec![reachability("good", 0), reachability("bad", 1)]),
        sink.clone(),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    )
    .unwrap();
    let token = supervisor.shutdown_token();
    let run = tokio::spawn(supervisor.run(std::future::pending::<()>()));

    // The bad monitor writes its checking color, panics, and clears
    wait_until(|| sink.history(1).last() == Some(&SlotWrite::Clear)).await;

    // The good one keeps cycling
    let before = sink.history(0).len();
    wait_until(|| sink.history(0).len() >= before + 4).await;
    assert!(sink.is_cleared(1));

    token.cancel();
    let report = timeout(WAIT, run).await.unwrap().unwrap().unwrap();

    let bad = find(&report.monitors, "bad");
    assert!(matches!(bad.exit, MonitorExit::Crashed(ref reason) if reason.contains("exploded")));
    assert_eq!(bad.status, MonitorStatus::Down);
    assert_eq!(find(&report.monitors, "good").exit, MonitorExit::Stopped);
    assert_eq!(report.crashed().count(), 1);

    assert!(sink.is_cleared(0));
    assert!(sink.is_cleared(1));
}

#[tokio::test]
async fn test_shutdown_token_stops_run() {
    let sink = Arc::new(MemorySink::new(8));
    let probes = FakeProbes::default().with("a", Behavior::Fixed(ProbeResult::Boolean(false)));

    let supervisor = Supervisor::with_parts(
        config(vec![reachability("a", 7)]),
        sink.clone(),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    )
    .unwrap();
    let token = supervisor.shutdown_token();
    let run = tokio::spawn(supervisor.run(std::future::pending::<()>()));

    let unhealthy = Palette::default().unhealthy;
    wait_until(|| sink.get(7) == Some(unhealthy)).await;

    token.cancel();
    let report = timeout(WAIT, run).await.unwrap().unwrap().unwrap();

    assert_eq!(report.monitors[0].exit, MonitorExit::Stopped);
    assert!(sink.is_cleared(7));
}

#[tokio::test]
async fn test_new_opens_configured_sink() {
    let supervisor = Supervisor::new(config(vec![reachability("a", 3), temperature("b", 4)]))
        .await
        .unwrap();

    assert_eq!(supervisor.sink().slot_count(), 8);
    assert_eq!(supervisor.config().slots(), vec![3, 4]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_until_signal_stops_on_sigterm() {
    let sink = Arc::new(MemorySink::new(8));
    let probes = FakeProbes::default().with("a", Behavior::Fixed(ProbeResult::Boolean(true)));

    let supervisor = Supervisor::with_parts(
        config(vec![reachability("a", 2)]),
        sink.clone(),
        Arc::new(probes),
        Arc::new(RecordingReporter::default()),
    )
    .unwrap();
    let run = tokio::spawn(supervisor.run_until_signal());

    // Handlers are in place before the first monitor writes
    let healthy = Palette::default().healthy;
    wait_until(|| sink.get(2) == Some(healthy)).await;

    let status = tokio::process::Command::new("kill")
        .arg("-TERM")
        .arg(std::process::id().to_string())
        .status()
        .await
        .unwrap();
    assert!(status.success());

    let report = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert_eq!(report.monitors[0].exit, MonitorExit::Stopped);
    assert!(sink.is_cleared(2));
}
