//! Self-rearming one-shot tick schedule.
//!
//! # Contract
//!
//! Every firing, before any other work:
//! 1. acknowledge the alarm
//! 2. arm the next deadline at `now + period`
//!
//! On a cycle boundary the deadline is pushed to `now + period + rest`.
//! Deadlines derive from the hardware clock at entry, never from the previous
//! deadline: entry jitter self-corrects, handler latency does not accumulate
//! into ordinary ticks.
//!
//! A tick that is still running when its successor's deadline passes is a
//! missed deadline. It is counted, never compensated.
//!
//! A rejected `arm` ends the chain: no firing is pending afterwards. The
//! error is returned so the caller can record it.

use crate::error::AlarmError;
use crate::fault::Diagnostics;

/// Hardware alarm seam.
///
/// Time unit is microseconds on a free-running monotonic clock.
pub trait AlarmTimer {
    /// Current time
    fn now(&self) -> u64;

    /// Program the one-shot alarm to fire at `deadline`, replacing any
    /// pending firing
    fn arm(&mut self, deadline: u64) -> Result<(), AlarmError>;

    /// Clear the pending firing condition
    fn acknowledge(&mut self) {}
}

/// Deadline bookkeeping for the tick handler.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    period_us: u32,
    rest_us: u32,
    entered_at: u64,
    deadline: u64,
}

impl TickScheduler {
    pub const fn new(period_us: u32, rest_us: u32) -> Self {
        Self {
            period_us,
            rest_us,
            entered_at: 0,
            deadline: 0,
        }
    }

    /// Arm the very first firing (startup, after every table is built)
    pub fn start<T: AlarmTimer>(&mut self, timer: &mut T) -> Result<u64, AlarmError> {
        let now = timer.now();
        let deadline = now + self.period_us as u64;
        self.entered_at = now;
        self.deadline = deadline;
        timer.arm(deadline)?;
        Ok(deadline)
    }

    /// Tick entry: acknowledge, then rearm for one period from now.
    ///
    /// Returns the entry timestamp. On error the entry time is still
    /// recorded (see `entered_at`).
    #[inline]
    pub fn begin<T: AlarmTimer>(&mut self, timer: &mut T) -> Result<u64, AlarmError> {
        timer.acknowledge();
        let now = timer.now();
        self.entered_at = now;
        self.deadline = now + self.period_us as u64;
        timer.arm(self.deadline)?;
        Ok(now)
    }

    /// Cycle boundary: push the already-armed deadline out by the rest interval.
    #[inline]
    pub fn extend_for_rest<T: AlarmTimer>(&mut self, timer: &mut T) -> Result<u64, AlarmError> {
        self.deadline = self.entered_at + self.period_us as u64 + self.rest_us as u64;
        timer.arm(self.deadline)?;
        Ok(self.deadline)
    }

    /// Tick exit: record a miss if the handler outlived the next deadline.
    ///
    /// Returns the lateness in µs when the deadline was missed.
    #[inline]
    pub fn finish<T: AlarmTimer>(&self, timer: &T, diagnostics: &Diagnostics) -> Option<u64> {
        let now = timer.now();
        if now >= self.deadline {
            let late = now - self.deadline;
            diagnostics.record_missed_deadline(late.min(u32::MAX as u64) as u32);
            Some(late)
        } else {
            None
        }
    }

    /// Deadline currently armed.
    #[inline]
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    /// Entry time of the last tick.
    #[inline]
    pub fn entered_at(&self) -> u64 {
        self.entered_at
    }

    #[inline]
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    #[inline]
    pub fn rest_us(&self) -> u32 {
        self.rest_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimTimer;

    #[test]
    fn test_begin_rearms_from_now() {
        let mut timer = SimTimer::new(1_000);
        let mut sched = TickScheduler::new(20, 250_000);

        let entered = sched.begin(&mut timer).unwrap();
        assert_eq!(entered, 1_000);
        assert_eq!(timer.armed(), Some(1_020));
        assert_eq!(timer.acknowledged(), 1);
    }

    #[test]
    fn test_rest_extension() {
        let mut timer = SimTimer::new(5_000);
        let mut sched = TickScheduler::new(20, 250_000);

        sched.begin(&mut timer).unwrap();
        timer.advance(3); // work done inside the handler
        assert_eq!(sched.extend_for_rest(&mut timer), Ok(5_000 + 20 + 250_000));
        assert_eq!(timer.armed(), Some(255_020));
    }

    #[test]
    fn test_finish_counts_miss() {
        let diag = Diagnostics::new();
        let mut timer = SimTimer::new(0);
        let mut sched = TickScheduler::new(20, 250_000);

        sched.begin(&mut timer).unwrap();
        timer.advance(5);
        assert_eq!(sched.finish(&timer, &diag), None);
        assert_eq!(diag.missed_deadlines(), 0);

        sched.begin(&mut timer).unwrap();
        timer.advance(27);
        assert_eq!(sched.finish(&timer, &diag), Some(7));
        assert_eq!(diag.missed_deadlines(), 1);
    }

    #[test]
    fn test_rejected_arm_keeps_entry_time() {
        let mut timer = SimTimer::new(2_000);
        let mut sched = TickScheduler::new(20, 250_000);

        timer.reject_next_arms(1);
        assert_eq!(sched.begin(&mut timer), Err(AlarmError { code: -1 }));
        assert_eq!(sched.entered_at(), 2_000);
        assert_eq!(timer.armed(), None);

        assert_eq!(sched.begin(&mut timer), Ok(2_000));
        assert_eq!(timer.armed(), Some(2_020));
    }
}
