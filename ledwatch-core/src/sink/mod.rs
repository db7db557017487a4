//! Indicator sinks: the addressable strip monitors write their colors to
//!
//! A sink is shared by every monitor. Writes to different slots must be safe
//! to issue concurrently without external locking; each implementation
//! provides its own internal discipline for that.

mod log;
mod memory;
mod remote;

pub use log::LogSink;
pub use memory::{MemorySink, SlotWrite, DEFAULT_HISTORY_CAPACITY};
pub use remote::{RemoteSink, StripCommand};

use crate::color::Color;
use async_trait::async_trait;

/// Addressable array of color slots
///
/// Writes never fail from the caller's point of view. Implementations log
/// and drop writes they cannot perform (absent hardware, out-of-range index,
/// broken connection).
#[async_trait]
pub trait IndicatorSink: Send + Sync {
    /// Number of addressable slots
    fn slot_count(&self) -> usize;

    /// Set slot `index` to `color`
    async fn set_pixel(&self, index: usize, color: Color);

    /// Turn slot `index` off
    async fn clear(&self, index: usize);
}

/// Clear every slot in `slots`
pub async fn clear_slots<S>(sink: &S, slots: impl IntoIterator<Item = usize>)
where
    S: IndicatorSink + ?Sized,
{
    for slot in slots {
        sink.clear(slot).await;
    }
}
