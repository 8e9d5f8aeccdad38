#![forbid(unsafe_code)]

//! Delivery policies and frame counting.

use std::cell::Cell;
use std::rc::Rc;

/// When and how often queued events reach their handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventQueueMode {
    /// Call the handler immediately on fire.
    #[default]
    Synchronous,
    /// Queue every event and deliver all of them, in fire order, on flush.
    All,
    /// Deliver only the most recently fired event per flush.
    LatestOnly,
    /// Deliver only the earliest fired event per flush.
    FirstOnly,
    /// Like [`All`](Self::All), but never in the frame the event was fired.
    AllNextFrame,
    /// Like [`LatestOnly`](Self::LatestOnly), but never in the frame the
    /// event was fired.
    LatestOnlyNextFrame,
    /// Like [`FirstOnly`](Self::FirstOnly), but never in the frame the event
    /// was fired.
    FirstOnlyNextFrame,
}

impl EventQueueMode {
    /// Whether events wait for a flush.
    #[must_use]
    pub const fn is_queued(self) -> bool {
        !matches!(self, Self::Synchronous)
    }

    /// Whether delivery is held back until a later frame.
    #[must_use]
    pub const fn is_next_frame(self) -> bool {
        matches!(
            self,
            Self::AllNextFrame | Self::LatestOnlyNextFrame | Self::FirstOnlyNextFrame
        )
    }

    /// The coalescing rule, with the frame delay stripped.
    #[must_use]
    pub const fn coalescing(self) -> Self {
        match self {
            Self::AllNextFrame => Self::All,
            Self::LatestOnlyNextFrame => Self::LatestOnly,
            Self::FirstOnlyNextFrame => Self::FirstOnly,
            other => other,
        }
    }
}

/// Source of the current frame number.
pub trait FrameCounter {
    fn frame_count(&self) -> u64;
}

/// Shared frame counter advanced by the host loop.
///
/// Clones observe the same count.
#[derive(Debug, Clone, Default)]
pub struct TickCounter {
    count: Rc<Cell<u64>>,
}

impl TickCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next frame.
    pub fn advance(&self) {
        self.count.set(self.count.get() + 1);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.get()
    }
}

impl FrameCounter for TickCounter {
    fn frame_count(&self) -> u64 {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_classification() {
        assert_eq!(EventQueueMode::default(), EventQueueMode::Synchronous);
        assert!(!EventQueueMode::Synchronous.is_queued());
        assert!(EventQueueMode::FirstOnly.is_queued());
        assert!(EventQueueMode::FirstOnlyNextFrame.is_next_frame());
        assert!(!EventQueueMode::LatestOnly.is_next_frame());
        assert_eq!(
            EventQueueMode::LatestOnlyNextFrame.coalescing(),
            EventQueueMode::LatestOnly
        );
        assert_eq!(EventQueueMode::All.coalescing(), EventQueueMode::All);
    }

    #[test]
    fn tick_counter_clones_share_count() {
        let counter = TickCounter::new();
        let view = counter.clone();
        counter.advance();
        counter.advance();
        assert_eq!(view.frame_count(), 2);
    }
}
