//! Network reachability probe

use super::{Probe, ProbeResult};
use crate::error::ProbeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// How reachability is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReachabilityMethod {
    /// ICMP echo via the system `ping` binary
    #[default]
    Ping,
    /// TCP connect to a port on the target
    Tcp { port: u16 },
}

/// Checks whether a host answers within a bounded time budget.
///
/// Every failure mode (unreachable host, timeout, missing `ping` binary,
/// DNS failure) is reported as `Boolean(false)`; this probe never returns an
/// error.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    target: String,
    method: ReachabilityMethod,
    attempts: u32,
    timeout: Duration,
}

impl ReachabilityProbe {
    /// Create a probe using `method` against `target`
    pub fn new(
        target: impl Into<String>,
        method: ReachabilityMethod,
        attempts: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            method,
            attempts: attempts.max(1),
            timeout,
        }
    }

    /// ICMP probe sending `attempts` echo requests
    pub fn ping(target: impl Into<String>, attempts: u32, timeout: Duration) -> Self {
        Self::new(target, ReachabilityMethod::Ping, attempts, timeout)
    }

    /// TCP probe trying up to `attempts` connections to `port`
    pub fn tcp(target: impl Into<String>, port: u16, attempts: u32, timeout: Duration) -> Self {
        Self::new(target, ReachabilityMethod::Tcp { port }, attempts, timeout)
    }

    /// Target host
    pub fn target(&self) -> &str {
        &self.target
    }

    /// True when the target answered within the time budget
    pub async fn check_reachable(&self) -> bool {
        match self.method {
            ReachabilityMethod::Ping => self.ping_once().await,
            ReachabilityMethod::Tcp { port } => self.connect_any(port).await,
        }
    }

    async fn ping_once(&self) -> bool {
        // Never let the target be parsed as a ping option
        if self.target.starts_with('-') {
            warn!("Refusing to ping invalid target '{}'", self.target);
            return false;
        }

        let mut cmd = Command::new("ping");
        cmd.arg("-c")
            .arg(self.attempts.to_string())
            .arg(&self.target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) => {
                debug!("ping {} exited with {}", self.target, status);
                status.success()
            }
            Ok(Err(e)) => {
                debug!("ping {} could not run: {}", self.target, e);
                false
            }
            Err(_) => {
                debug!("ping {} timed out after {:?}", self.target, self.timeout);
                false
            }
        }
    }

    async fn connect_any(&self, port: u16) -> bool {
        let per_attempt = (self.timeout / self.attempts).max(Duration::from_millis(1));

        for attempt in 1..=self.attempts {
            match timeout(per_attempt, TcpStream::connect((self.target.as_str(), port))).await {
                Ok(Ok(_)) => return true,
                Ok(Err(e)) => {
                    debug!(
                        "connect {}:{} attempt {}/{} failed: {}",
                        self.target, port, attempt, self.attempts, e
                    );
                }
                Err(_) => {
                    debug!(
                        "connect {}:{} attempt {}/{} timed out",
                        self.target, port, attempt, self.attempts
                    );
                }
            }
        }

        false
    }
}

#[async_trait]
impl Probe for ReachabilityProbe {
    fn kind(&self) -> &str {
        match self.method {
            ReachabilityMethod::Ping => "ping",
            ReachabilityMethod::Tcp { .. } => "tcp",
        }
    }

    async fn probe(&self) -> Result<ProbeResult, ProbeError> {
        Ok(ProbeResult::Boolean(self.check_reachable().await))
    }
}
