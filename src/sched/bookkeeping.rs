//! Per-transition updates of thread timing and priority metrics.
//!
//! These functions only touch a thread's [`SchedInfo`]; moving the id in or
//! out of the ready container is the kernel's job. They never fail: state
//! checks happen before they are called.

use crate::thread::{SchedInfo, ThreadState};
use crate::time::{elapsed, Tick};

/// Move a thread to READY at tick `now`.
///
/// Records `start_time` on the first READY transition (never for the
/// bootstrap thread), credits the time spent blocked, and stamps
/// `ready_since`. Returns the state the thread was in before.
pub fn mark_ready(info: &mut SchedInfo, now: Tick, is_bootstrap: bool) -> ThreadState {
    let previous = info.state;

    if info.start_time.is_none() && !is_bootstrap {
        info.start_time = Some(now);
    }

    if previous == ThreadState::Blocked {
        if let Some(since) = info.sleep_start.take() {
            info.total_sleep += elapsed(since, now);
        }
    }

    info.ready_since = now;
    info.state = ThreadState::Ready;
    previous
}

/// Move a thread to BLOCKED at tick `now`.
pub fn mark_blocked(info: &mut SchedInfo, now: Tick) {
    info.sleep_start = Some(now);
    info.state = ThreadState::Blocked;
}

/// Move a thread to RUNNING at tick `now`.
pub fn begin_burst(info: &mut SchedInfo, now: Tick) {
    info.burst_start = now;
    info.state = ThreadState::Running;
}

/// Close the CPU burst that started at `burst_start` and return its length.
///
/// The burst estimate is the average of the measured burst and the previous
/// estimate. With `recompute_priority`, recent CPU usage is halved after
/// adding the burst and the priority becomes `base + offset + usage / 2`, so
/// CPU-bound threads drift towards less favoured values.
pub fn end_burst(info: &mut SchedInfo, now: Tick, recompute_priority: bool) -> Tick {
    let burst = elapsed(info.burst_start, now);

    info.total_cpu = info.total_cpu.saturating_add(burst);
    info.estimated_burst = average(burst, info.estimated_burst);

    if recompute_priority {
        info.cpu_usage = average(info.cpu_usage, burst);
        let penalty = i32::try_from(info.cpu_usage / 2).unwrap_or(i32::MAX);
        info.priority = info
            .base_priority
            .saturating_add(info.priority_offset)
            .saturating_add(penalty);
    }

    burst
}

/// `(a + b) / 2` rounded down, without overflowing.
fn average(a: Tick, b: Tick) -> Tick {
    a / 2 + b / 2 + (a & b & 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> SchedInfo {
        SchedInfo::new(150, 50, 0)
    }

    #[test]
    fn test_first_ready_sets_start_time_once() {
        let mut info = fresh();
        assert_eq!(mark_ready(&mut info, 4, false), ThreadState::New);
        assert_eq!(info.start_time, Some(4));
        assert_eq!(info.ready_since, 4);

        begin_burst(&mut info, 6);
        mark_ready(&mut info, 9, false);
        assert_eq!(info.start_time, Some(4));
        assert_eq!(info.ready_since, 9);
    }

    #[test]
    fn test_first_ready_at_tick_zero_is_recorded() {
        let mut info = fresh();
        mark_ready(&mut info, 0, false);
        assert_eq!(info.start_time, Some(0));
    }

    #[test]
    fn test_bootstrap_has_no_start_time() {
        let mut info = fresh();
        mark_ready(&mut info, 12, true);
        assert_eq!(info.start_time, None);
        assert_eq!(info.state, ThreadState::Ready);
    }

    #[test]
    fn test_sleep_accounting() {
        let mut info = fresh();
        mark_ready(&mut info, 0, false);
        begin_burst(&mut info, 1);
        mark_blocked(&mut info, 10);
        mark_ready(&mut info, 25, false);
        assert_eq!(info.total_sleep, 15);

        begin_burst(&mut info, 30);
        mark_blocked(&mut info, 40);
        mark_ready(&mut info, 44, false);
        assert_eq!(info.total_sleep, 19);
    }

    #[test]
    fn test_ready_to_ready_does_not_count_sleep() {
        let mut info = fresh();
        mark_ready(&mut info, 5, false);
        mark_ready(&mut info, 50, false);
        assert_eq!(info.total_sleep, 0);
    }

    #[test]
    fn test_end_burst_updates_estimate() {
        let mut info = SchedInfo::new(150, 50, 10);
        begin_burst(&mut info, 100);
        assert_eq!(end_burst(&mut info, 120, false), 20);
        assert_eq!(info.estimated_burst, 15);
        assert_eq!(info.total_cpu, 20);
        assert_eq!(info.priority, 150);
    }

    #[test]
    fn test_end_burst_recomputes_priority() {
        let mut info = SchedInfo::new(150, 50, 0);
        begin_burst(&mut info, 0);
        end_burst(&mut info, 40, true);
        assert_eq!(info.cpu_usage, 20);
        assert_eq!(info.priority, 160);

        begin_burst(&mut info, 50);
        end_burst(&mut info, 50, true);
        assert_eq!(info.cpu_usage, 10);
        assert_eq!(info.priority, 155);
    }

    #[test]
    fn test_end_burst_with_huge_estimate() {
        let mut info = SchedInfo::new(150, 50, u64::MAX);
        info.cpu_usage = u64::MAX;
        info.total_cpu = u64::MAX - 1;
        begin_burst(&mut info, 0);
        assert_eq!(end_burst(&mut info, 5, true), 5);
        assert_eq!(info.estimated_burst, u64::MAX / 2 + 3);
        assert_eq!(info.cpu_usage, u64::MAX / 2 + 3);
        assert_eq!(info.total_cpu, u64::MAX);
        assert_eq!(info.priority, i32::MAX);
    }
}
