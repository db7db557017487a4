//! Per-cycle status lines
//!
//! Every monitor cycle produces one [`StatusLine`]. Reporters decide where it
//! goes: the terminal (optionally ANSI-colored) or the tracing log.

use crate::error::ProbeError;
use crate::probe::ProbeResult;
use chrono::{DateTime, Local};
use std::fmt;
use std::io::Write;
use tracing::{info, warn};

const TERM_ALERT: &str = "\x1b[91m";
const TERM_OK: &str = "\x1b[92m";
const TERM_BLUE_BACKGROUND: &str = "\x1b[44m";
const TERM_END: &str = "\x1b[0m";

/// Result of one cycle as reported to the operator
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// The probe produced a result
    Result(ProbeResult),
    /// The probe failed; the message is the probe error
    Error(String),
}

impl From<&Result<ProbeResult, ProbeError>> for StatusOutcome {
    fn from(result: &Result<ProbeResult, ProbeError>) -> Self {
        match result {
            Ok(result) => StatusOutcome::Result(*result),
            Err(e) => StatusOutcome::Error(e.to_string()),
        }
    }
}

/// One human-readable line describing a finished cycle
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub monitor: String,
    pub kind: String,
    pub slot: usize,
    pub checked_at: DateTime<Local>,
    pub outcome: StatusOutcome,
}

impl StatusLine {
    /// True for failed reachability checks and probe errors
    pub fn is_alert(&self) -> bool {
        matches!(
            self.outcome,
            StatusOutcome::Result(ProbeResult::Boolean(false)) | StatusOutcome::Error(_)
        )
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: ",
            self.checked_at.format("%Y-%m-%d %H:%M:%S"),
            self.monitor,
            self.kind
        )?;
        match &self.outcome {
            StatusOutcome::Result(result) => write!(f, "{}", result),
            StatusOutcome::Error(message) => write!(f, "ERROR ({})", message),
        }
    }
}

/// Destination for status lines
pub trait StatusReporter: Send + Sync {
    fn report(&self, line: &StatusLine);
}

/// Writes status lines to stdout, colored like a traffic light when `ansi`
/// is enabled
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    ansi: bool,
}

impl ConsoleReporter {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    /// Render a line exactly as it would be printed
    pub fn render(&self, line: &StatusLine) -> String {
        if !self.ansi {
            return line.to_string();
        }

        let start = match &line.outcome {
            StatusOutcome::Result(ProbeResult::Boolean(true)) => TERM_OK,
            StatusOutcome::Result(ProbeResult::Numeric(_)) => TERM_BLUE_BACKGROUND,
            StatusOutcome::Result(ProbeResult::Boolean(false)) | StatusOutcome::Error(_) => {
                TERM_ALERT
            }
        };
        format!("{}{}{}", start, line, TERM_END)
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StatusReporter for ConsoleReporter {
    fn report(&self, line: &StatusLine) {
        // Blocking write on a runtime thread; at most one short line per cycle
        let mut stdout = std::io::stdout().lock();
        // Nothing sensible to do if stdout is gone
        let _ = writeln!(stdout, "{}", self.render(line));
    }
}

/// Emits status lines as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, line: &StatusLine) {
        if line.is_alert() {
            warn!(monitor = %line.monitor, slot = line.slot, "{}", line);
        } else {
            info!(monitor = %line.monitor, slot = line.slot, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(outcome: StatusOutcome) -> StatusLine {
        StatusLine {
            monitor: "router".to_string(),
            kind: "ping".to_string(),
            slot: 5,
            checked_at: Local.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
            outcome,
        }
    }

    #[test]
    fn test_plain_rendering() {
        let reporter = ConsoleReporter::new(false);
        assert_eq!(
            reporter.render(&line(StatusOutcome::Result(ProbeResult::Boolean(true)))),
            "2024-03-01 08:30:00 router ping: OK"
        );
        assert_eq!(
            reporter.render(&line(StatusOutcome::Result(ProbeResult::Boolean(false)))),
            "2024-03-01 08:30:00 router ping: FAILED"
        );
        assert_eq!(
            reporter.render(&line(StatusOutcome::Error("sensor gone".to_string()))),
            "2024-03-01 08:30:00 router ping: ERROR (sensor gone)"
        );
    }

    #[test]
    fn test_ansi_rendering() {
        let reporter = ConsoleReporter::new(true);

        let ok = reporter.render(&line(StatusOutcome::Result(ProbeResult::Boolean(true))));
        assert!(ok.starts_with(TERM_OK) && ok.ends_with(TERM_END));

        let failed = reporter.render(&line(StatusOutcome::Result(ProbeResult::Boolean(false))));
        assert!(failed.starts_with(TERM_ALERT));

        let reading = reporter.render(&line(StatusOutcome::Result(ProbeResult::Numeric(48.25))));
        assert!(reading.starts_with(TERM_BLUE_BACKGROUND));
        assert!(reading.contains("ping: 48.2") || reading.contains("ping: 48.3"));
    }

    #[test]
    fn test_alerts() {
        assert!(line(StatusOutcome::Result(ProbeResult::Boolean(false))).is_alert());
        assert!(line(StatusOutcome::Error("x".to_string())).is_alert());
        assert!(!line(StatusOutcome::Result(ProbeResult::Numeric(1.0))).is_alert());
    }
}
