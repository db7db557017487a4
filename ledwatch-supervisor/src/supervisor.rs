//! Runs every configured monitor against one shared indicator sink

use crate::factory::{build_monitor, open_sink, reporter_for, ProbeFactory, SystemProbes};
use crate::signal::ShutdownSignal;
use crate::{Result, SupervisorError};
use chrono::{DateTime, Utc};
use ledwatch_core::config::AgentConfig;
use ledwatch_core::error::LedwatchError;
use ledwatch_core::monitor::{MonitorExit, MonitorHandle, MonitorStatus};
use ledwatch_core::report::StatusReporter;
use ledwatch_core::sink::IndicatorSink;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the sink and the monitors for one configuration.
///
/// Construction checks the startup invariants; nothing is written to the
/// strip until [`Supervisor::run`] starts the monitors.
pub struct Supervisor {
    config: AgentConfig,
    sink: Arc<dyn IndicatorSink>,
    probes: Arc<dyn ProbeFactory>,
    reporter: Arc<dyn StatusReporter>,
    token: CancellationToken,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("monitors", &self.config.monitors.len())
            .field("slots", &self.sink.slot_count())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl Supervisor {
    /// Validate `config` and open its sink with system probes
    pub async fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let sink = open_sink(&config.strip).await?;
        let reporter = reporter_for(&config.console);
        Self::with_parts(config, sink, Arc::new(SystemProbes), reporter)
    }

    /// Assemble a supervisor from prebuilt parts
    pub fn with_parts(
        config: AgentConfig,
        sink: Arc<dyn IndicatorSink>,
        probes: Arc<dyn ProbeFactory>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        config.validate()?;

        let len = sink.slot_count();
        if let Some(spec) = config.monitors.iter().find(|spec| spec.slot >= len) {
            return Err(LedwatchError::SlotOutOfRange {
                monitor: spec.name.clone(),
                slot: spec.slot,
                len,
            }
            .into());
        }

        Ok(Self {
            config,
            sink,
            probes,
            reporter,
            token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn sink(&self) -> Arc<dyn IndicatorSink> {
        self.sink.clone()
    }

    /// Token that stops every monitor when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Build every monitor, then start them all.
    ///
    /// If any monitor fails to build, none is started.
    pub fn start(&self) -> Result<Vec<MonitorHandle>> {
        let monitors = self
            .config
            .monitors
            .iter()
            .map(|spec| {
                build_monitor(
                    spec,
                    &self.config.palette,
                    self.probes.as_ref(),
                    self.sink.clone(),
                    self.reporter.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(monitors
            .into_iter()
            .map(|monitor| monitor.start(self.token.child_token()))
            .collect())
    }

    /// Run all monitors until `shutdown` resolves or the shutdown token is
    /// cancelled, then stop them and wait for every slot to be cleared.
    pub async fn run<F>(self, shutdown: F) -> Result<ShutdownReport>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let handles = self.start()?;
        info!("Supervising {} monitors", handles.len());

        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            _ = self.token.cancelled() => info!("Shutdown token cancelled"),
        }

        let monitors = self.stop_all(handles).await;

        Ok(ShutdownReport {
            started_at,
            stopped_at: Utc::now(),
            monitors,
        })
    }

    /// Run until Ctrl-C or SIGTERM.
    ///
    /// The signal handlers are installed before any monitor starts; failing
    /// to install them is a startup error.
    pub async fn run_until_signal(self) -> Result<ShutdownReport> {
        let signal = ShutdownSignal::install().map_err(SupervisorError::Signal)?;
        self.run(signal.recv()).await
    }

    /// Cancel every monitor and wait for each to finish.
    ///
    /// A monitor that crashed has already cleared its slot; the slot is
    /// cleared again here in case its task was aborted before it could.
    pub async fn stop_all(&self, handles: Vec<MonitorHandle>) -> Vec<MonitorReport> {
        self.token.cancel();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let slot = handle.slot();
            let status = handle.subscribe();

            let exit = handle.join().await;
            if let MonitorExit::Crashed(reason) = &exit {
                warn!("Monitor {} had crashed: {}", name, reason);
                self.sink.clear(slot).await;
            }

            let status = *status.borrow();
            debug!("Monitor {} finished with status {}", name, status);
            reports.push(MonitorReport {
                name,
                slot,
                status,
                exit,
            });
        }

        info!("All monitors stopped");
        reports
    }
}

/// Final state of one monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub name: String,
    pub slot: usize,
    /// Last status the monitor published
    pub status: MonitorStatus,
    pub exit: MonitorExit,
}

/// Outcome of a supervised run
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// One entry per monitor, in configuration order
    pub monitors: Vec<MonitorReport>,
}

impl ShutdownReport {
    /// Monitors whose loop crashed during the run
    pub fn crashed(&self) -> impl Iterator<Item = &MonitorReport> {
        self.monitors
            .iter()
            .filter(|report| matches!(report.exit, MonitorExit::Crashed(_)))
    }
}
