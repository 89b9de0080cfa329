//! Engine-time timers
//!
//! Both timers run on milliseconds fed in by the host loop, never on a real
//! clock, so a stopped timer simply stops accumulating and nothing can fire
//! after it is torn down.

/// Repeating tick timer
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    interval_ms: u64,
    elapsed_ms: u64,
    running: bool,
    /// Interval to adopt at the next tick boundary
    pending_ms: Option<u64>,
    /// Bumped every time the timer is torn down and recreated
    generation: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)create the timer with a fresh period
    pub fn start(&mut self, interval_ms: u32) {
        self.interval_ms = u64::from(interval_ms.max(1));
        self.elapsed_ms = 0;
        self.pending_ms = None;
        self.running = true;
        self.generation += 1;
    }

    /// Tear the timer down; no tick fires until the next `start`
    pub fn stop(&mut self) {
        if self.running {
            self.generation += 1;
        }
        self.running = false;
        self.elapsed_ms = 0;
        self.pending_ms = None;
    }

    /// Change the period once the current one completes
    pub fn reschedule(&mut self, interval_ms: u32) {
        if self.running {
            self.pending_ms = Some(u64::from(interval_ms.max(1)));
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Milliseconds until the next tick, None when stopped
    pub fn until_next(&self) -> Option<u64> {
        self.running
            .then(|| self.interval_ms.saturating_sub(self.elapsed_ms))
    }

    pub fn elapse(&mut self, ms: u64) {
        if self.running {
            self.elapsed_ms += ms;
        }
    }

    /// Consume one due tick
    pub fn take_due(&mut self) -> bool {
        if !self.running || self.elapsed_ms < self.interval_ms {
            return false;
        }
        self.elapsed_ms -= self.interval_ms;
        true
    }

    /// Recreate the timer with the pending interval, if any. Call at a tick
    /// boundary, after the tick has run.
    pub fn apply_pending(&mut self) -> bool {
        match self.pending_ms.take() {
            Some(next) if self.running => {
                self.interval_ms = next;
                self.elapsed_ms = 0;
                self.generation += 1;
                true
            }
            _ => false,
        }
    }
}

/// One-shot shield expiry. Re-arming replaces the deadline, so only the
/// latest pickup's timer can ever fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShieldTimer {
    deadline_ms: Option<u64>,
}

impl ShieldTimer {
    pub fn arm(&mut self, now_ms: u64, duration_ms: u64) {
        self.deadline_ms = Some(now_ms + duration_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn until(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }

    /// True exactly once when the deadline has passed
    pub fn take_expired(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_fires_on_interval() {
        let mut sched = TickScheduler::new();
        sched.start(1000);
        sched.elapse(999);
        assert!(!sched.take_due());
        sched.elapse(1);
        assert!(sched.take_due());
        assert!(!sched.take_due());
        assert_eq!(sched.until_next(), Some(1000));
    }

    #[test]
    fn test_stopped_scheduler_never_fires() {
        let mut sched = TickScheduler::new();
        sched.start(100);
        sched.elapse(50);
        sched.stop();
        sched.elapse(10_000);
        assert!(!sched.take_due());
        assert_eq!(sched.until_next(), None);
    }

    #[test]
    fn test_reschedule_applies_at_boundary() {
        let mut sched = TickScheduler::new();
        sched.start(1000);
        sched.elapse(400);
        sched.reschedule(500);
        // Current period still runs at the old cadence
        assert_eq!(sched.until_next(), Some(600));
        sched.elapse(600);
        let generation = sched.generation();
        assert!(sched.take_due());
        assert_eq!(sched.interval_ms(), 1000);
        assert!(sched.apply_pending());
        assert!(!sched.apply_pending());
        assert_eq!(sched.interval_ms(), 500);
        assert_eq!(sched.generation(), generation + 1);
        assert_eq!(sched.until_next(), Some(500));
    }

    #[test]
    fn test_restart_resets_period() {
        let mut sched = TickScheduler::new();
        sched.start(300);
        sched.elapse(250);
        sched.stop();
        sched.start(300);
        assert_eq!(sched.until_next(), Some(300));
    }

    #[test]
    fn test_shield_latest_arm_wins() {
        let mut timer = ShieldTimer::default();
        timer.arm(0, 5000);
        timer.arm(3000, 5000);
        assert!(!timer.take_expired(5000));
        assert!(timer.take_expired(8000));
        assert!(!timer.take_expired(9000));
    }

    #[test]
    fn test_cancelled_shield_never_expires() {
        let mut timer = ShieldTimer::default();
        timer.arm(100, 5000);
        timer.cancel();
        assert!(!timer.take_expired(60_000));
        assert_eq!(timer.until(0), None);
    }
}
