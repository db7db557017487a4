//! ledwatch supervisor - runs a whole configuration of monitors
//!
//! The supervisor owns the shared indicator sink, starts one monitor per
//! configured check, and on shutdown stops them all and waits until every
//! slot has been cleared.
//!
//! ```rust,no_run
//! use ledwatch_core::config::AgentConfig;
//! use ledwatch_supervisor::Supervisor;
//!
//! # async fn example() -> ledwatch_supervisor::Result<()> {
//! let config = AgentConfig::load()?;
//! let report = Supervisor::new(config).await?.run_until_signal().await?;
//! for monitor in &report.monitors {
//!     println!("{} -> {}", monitor.name, monitor.status);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod factory;
mod signal;
mod supervisor;

#[cfg(test)]
mod tests;

pub use error::{Result, SupervisorError};
pub use factory::{build_monitor, open_sink, policy_for, reporter_for, ProbeFactory, SystemProbes};
pub use signal::ShutdownSignal;
pub use supervisor::{MonitorReport, ShutdownReport, Supervisor};
