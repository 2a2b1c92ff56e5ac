//! Monotonic tick counter.

use super::Tick;
use portable_atomic::{AtomicU64, Ordering};

/// Global tick counter for scheduling decisions.
///
/// The timer interrupt handler advances it; the scheduler only reads it.
/// Every timestamp stored in a thread record comes from [`TickCounter::now`].
pub struct TickCounter {
    /// Number of ticks since system start
    ticks: AtomicU64,
}

impl TickCounter {
    /// Create a counter starting at tick 0.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter starting at `tick`.
    pub const fn starting_at(tick: Tick) -> Self {
        Self {
            ticks: AtomicU64::new(tick),
        }
    }

    /// Increment the tick counter (called from timer interrupt).
    pub fn increment(&self) {
        self.ticks.fetch_add(1, Ordering::AcqRel);
    }

    /// Advance the counter by `ticks`, e.g. when an idle CPU skips ahead
    /// to the next pending interrupt.
    pub fn advance(&self, ticks: Tick) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Get the current tick count.
    pub fn now(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counter() {
        let clock = TickCounter::new();
        assert_eq!(clock.now(), 0);
        clock.increment();
        clock.advance(9);
        assert_eq!(clock.now(), 10);
        assert_eq!(TickCounter::starting_at(25).now(), 25);
    }
}
