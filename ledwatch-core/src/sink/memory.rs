//! In-memory strip with per-slot write history

use super::IndicatorSink;
use crate::color::Color;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Number of writes remembered per slot
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// A single write recorded against a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    Set(Color),
    Clear,
}

#[derive(Debug, Default)]
struct SlotState {
    current: Option<Color>,
    history: VecDeque<SlotWrite>,
}

/// Strip held entirely in memory.
///
/// Every slot has its own lock, so monitors writing distinct slots never
/// contend with each other. Used when no strip hardware is present and as
/// the observable sink in tests.
#[derive(Debug)]
pub struct MemorySink {
    slots: Vec<Mutex<SlotState>>,
    history_capacity: usize,
}

impl MemorySink {
    /// Strip with `len` slots, all off
    pub fn new(len: usize) -> Self {
        Self::with_history_capacity(len, DEFAULT_HISTORY_CAPACITY)
    }

    /// Strip remembering at most `capacity` writes per slot
    pub fn with_history_capacity(len: usize, capacity: usize) -> Self {
        Self {
            slots: (0..len).map(|_| Mutex::new(SlotState::default())).collect(),
            history_capacity: capacity,
        }
    }

    fn slot(&self, index: usize) -> Option<MutexGuard<'_, SlotState>> {
        self.slots
            .get(index)
            .map(|slot| slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Apply a write and return the slot's previous color, or `None` when
    /// the index is out of range
    pub(crate) fn record(&self, index: usize, write: SlotWrite) -> Option<Option<Color>> {
        let Some(mut slot) = self.slot(index) else {
            warn!(
                "Ignoring write to slot {} on a strip with {} slots",
                index,
                self.slots.len()
            );
            return None;
        };

        let previous = slot.current;
        slot.current = match write {
            SlotWrite::Set(color) => Some(color),
            SlotWrite::Clear => None,
        };

        if self.history_capacity > 0 {
            if slot.history.len() == self.history_capacity {
                slot.history.pop_front();
            }
            slot.history.push_back(write);
        }

        Some(previous)
    }

    /// Current color of a slot; `None` when the slot is off or out of range
    pub fn get(&self, index: usize) -> Option<Color> {
        self.slot(index).and_then(|slot| slot.current)
    }

    /// True when the slot is off
    pub fn is_cleared(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    /// Writes recorded against a slot, oldest first
    pub fn history(&self, index: usize) -> Vec<SlotWrite> {
        self.slot(index)
            .map(|slot| slot.history.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Current color of every slot
    pub fn snapshot(&self) -> Vec<Option<Color>> {
        (0..self.slots.len()).map(|i| self.get(i)).collect()
    }
}

#[async_trait]
impl IndicatorSink for MemorySink {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    async fn set_pixel(&self, index: usize, color: Color) {
        self.record(index, SlotWrite::Set(color));
    }

    async fn clear(&self, index: usize) {
        self.record(index, SlotWrite::Clear);
    }
}
