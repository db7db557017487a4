//! Strip that logs every change instead of driving hardware

use super::memory::{MemorySink, SlotWrite};
use super::IndicatorSink;
use crate::color::Color;
use async_trait::async_trait;
use tracing::{debug, info};

/// Keeps the strip state in memory and logs each slot change.
///
/// Repeated writes of the same color are logged at debug level only, so a
/// steady state does not flood the log.
#[derive(Debug)]
pub struct LogSink {
    inner: MemorySink,
}

impl LogSink {
    pub fn new(len: usize) -> Self {
        Self {
            inner: MemorySink::new(len),
        }
    }

    /// Underlying in-memory state
    pub fn state(&self) -> &MemorySink {
        &self.inner
    }

    fn apply(&self, index: usize, write: SlotWrite) {
        let next = match write {
            SlotWrite::Set(color) => Some(color),
            SlotWrite::Clear => None,
        };

        match self.inner.record(index, write) {
            Some(previous) if previous != next => {
                info!(slot = index, "strip slot {} -> {}", index, describe(next));
            }
            Some(_) => {
                debug!(slot = index, "strip slot {} unchanged ({})", index, describe(next));
            }
            None => {}
        }
    }
}

fn describe(color: Option<Color>) -> String {
    match color {
        Some(color) => color.to_string(),
        None => "off".to_string(),
    }
}

#[async_trait]
impl IndicatorSink for LogSink {
    fn slot_count(&self) -> usize {
        self.inner.slot_count()
    }

    async fn set_pixel(&self, index: usize, color: Color) {
        self.apply(index, SlotWrite::Set(color));
    }

    async fn clear(&self, index: usize) {
        self.apply(index, SlotWrite::Clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_tracks_state() {
        let sink = LogSink::new(8);
        sink.set_pixel(6, Color::new(5, 5, 0)).await;
        sink.set_pixel(6, Color::new(5, 5, 0)).await;
        assert_eq!(sink.state().get(6), Some(Color::new(5, 5, 0)));

        sink.clear(6).await;
        assert!(sink.state().is_cleared(6));
        assert_eq!(sink.state().history(6).len(), 3);
        assert_eq!(sink.slot_count(), 8);
    }
}
