//! Process shutdown signals

use tracing::info;

/// Listeners for Ctrl-C and, on unix, SIGTERM.
///
/// Handlers are registered by [`ShutdownSignal::install`], so a signal that
/// arrives between installation and [`ShutdownSignal::recv`] is not lost.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignal {
    /// Register the signal handlers. Must be called within a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Register the signal handlers. Must be called within a tokio runtime.
    #[cfg(windows)]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Resolve once a shutdown signal arrives
    #[cfg(unix)]
    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("Received Ctrl-C"),
            _ = self.terminate.recv() => info!("Received SIGTERM"),
        }
    }

    /// Resolve once a shutdown signal arrives
    #[cfg(windows)]
    pub async fn recv(mut self) {
        self.ctrl_c.recv().await;
        info!("Received Ctrl-C");
    }
}
