//! Simulated time as seen by the scheduler.

pub mod tick;

pub use tick::TickCounter;

/// One unit of simulated time, as counted by the timer subsystem.
pub type Tick = u64;

/// Ticks elapsed from `since` to `now`, saturating at zero if the
/// counter was read out of order.
#[inline]
pub fn elapsed(since: Tick, now: Tick) -> Tick {
    now.saturating_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_saturates() {
        assert_eq!(elapsed(10, 25), 15);
        assert_eq!(elapsed(25, 10), 0);
    }
}
