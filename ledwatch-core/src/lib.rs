//! # ledwatch - health checks rendered on an LED strip
//!
//! ledwatch runs independent periodic checks (host reachability, CPU
//! temperature) and shows each check's latest result as a color on its own
//! slot of a shared indicator strip.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ledwatch_core::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(LogSink::new(8));
//!     let token = CancellationToken::new();
//!
//!     let handle = Monitor::builder()
//!         .name("router")
//!         .slot(5)
//!         .interval(Duration::from_secs(300))
//!         .probe(Arc::new(ReachabilityProbe::ping("192.168.10.1", 3, Duration::from_secs(10))))
//!         .policy(Arc::new(BinaryPolicy::default()))
//!         .sink(sink)
//!         .build()?
//!         .start(token.child_token());
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Probes** sample a condition and return a [`probe::ProbeResult`]
//! - **Color policies** map results to colors (binary palette or gradient)
//! - **Sinks** own the strip and accept per-slot writes concurrently
//! - **Monitors** bind one probe, one policy and one slot in a periodic loop
//!
//! The supervisor that runs a whole configuration lives in
//! `ledwatch-supervisor`.

pub mod color;
pub mod config;
pub mod error;
pub mod monitor;
pub mod policy;
pub mod probe;
pub mod report;
pub mod sink;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::color::{Color, Palette};
    pub use crate::config::{
        AgentConfig, ConsoleConfig, MonitorSpec, ProbeSpec, SinkConfig, StripConfig,
    };
    pub use crate::error::{LedwatchError, ProbeError, Result};
    pub use crate::monitor::{Monitor, MonitorBuilder, MonitorExit, MonitorHandle, MonitorStatus};
    pub use crate::policy::{BinaryPolicy, ColorPolicy, GradientPolicy};
    pub use crate::probe::{
        Probe, ProbeResult, ReachabilityMethod, ReachabilityProbe, TemperatureProbe,
    };
    pub use crate::report::{
        ConsoleReporter, StatusLine, StatusOutcome, StatusReporter, TracingReporter,
    };
    pub use crate::sink::{IndicatorSink, LogSink, MemorySink, RemoteSink, SlotWrite};
}
