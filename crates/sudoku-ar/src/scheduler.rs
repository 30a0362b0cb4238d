//! Tick cadence.
//!
//! [`IntervalScheduler`] decides when the next tick may run; it never runs
//! anything itself. A tick that is still in progress blocks the next one
//! ([`TickDecision::Overlap`]), and deadlines missed while a slow tick ran
//! are dropped instead of being replayed.

use crate::{Engine, EngineParams, TickOutcome};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
    fn sleep(&self, d: Duration);
}

#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Clock that only moves when told to. `sleep` advances it instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        *self.now.lock() += d;
    }

    pub fn set(&self, t: Duration) {
        *self.now.lock() = t;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickDecision {
    Run,
    /// Next tick is due after this much time.
    NotDue(Duration),
    /// The previous tick has not finished.
    Overlap,
}

#[derive(Clone, Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_due: Duration,
    in_tick: bool,
    skipped: u64,
}

impl IntervalScheduler {
    /// First tick is due immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: Duration::ZERO,
            in_tick: false,
            skipped: 0,
        }
    }

    /// Scheduler ticking at `params.tick_interval_ms`.
    pub fn from_params(params: &EngineParams) -> Self {
        Self::new(params.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Deadlines dropped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn poll(&self, now: Duration) -> TickDecision {
        if self.in_tick {
            TickDecision::Overlap
        } else if now < self.next_due {
            TickDecision::NotDue(self.next_due - now)
        } else {
            TickDecision::Run
        }
    }

    pub fn begin(&mut self, now: Duration) {
        self.in_tick = true;
        if now > self.next_due + self.interval {
            log::trace!("tick started {:?} late", now - self.next_due);
        }
    }

    /// Mark the tick finished at `now`. Returns how many deadlines passed
    /// while it ran; those ticks are skipped.
    pub fn finish(&mut self, now: Duration) -> u64 {
        self.in_tick = false;
        self.next_due += self.interval;
        let mut missed = 0;
        while self.next_due <= now {
            self.next_due += self.interval;
            missed += 1;
        }
        if missed > 0 {
            log::debug!("skipped {missed} tick(s) after a slow tick");
        }
        self.skipped += missed;
        missed
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub skipped: u64,
}

/// Drive `engine` at the scheduler's cadence until it stops.
///
/// A stop requested through [`Engine::stop_handle`] takes effect at the next
/// tick.
pub fn run_until(
    engine: &mut Engine,
    scheduler: &mut IntervalScheduler,
    clock: &dyn Clock,
) -> RunStats {
    let mut stats = RunStats::default();
    while engine.is_running() {
        match scheduler.poll(clock.now()) {
            TickDecision::Run => {
                scheduler.begin(clock.now());
                let outcome = engine.tick();
                stats.ticks += 1;
                stats.skipped += scheduler.finish(clock.now());
                if matches!(outcome, TickOutcome::Stopped) {
                    break;
                }
            }
            TickDecision::NotDue(wait) => clock.sleep(wait),
            TickDecision::Overlap => clock.sleep(scheduler.interval()),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn runs_on_interval() {
        let clock = ManualClock::new();
        let mut s = IntervalScheduler::new(100 * MS);
        assert_eq!(s.poll(clock.now()), TickDecision::Run);
        s.begin(clock.now());
        clock.advance(10 * MS);
        assert_eq!(s.finish(clock.now()), 0);
        assert_eq!(s.poll(clock.now()), TickDecision::NotDue(90 * MS));
        clock.advance(90 * MS);
        assert_eq!(s.poll(clock.now()), TickDecision::Run);
    }

    #[test]
    fn interval_comes_from_engine_params() {
        let params = EngineParams {
            tick_interval_ms: 40,
            ..EngineParams::default()
        };
        let s = IntervalScheduler::from_params(&params);
        assert_eq!(s.interval(), 40 * MS);
        assert_eq!(
            IntervalScheduler::from_params(&EngineParams::default()).interval(),
            100 * MS
        );
    }

    #[test]
    fn running_tick_blocks_the_next() {
        let clock = ManualClock::new();
        let mut s = IntervalScheduler::new(100 * MS);
        s.begin(clock.now());
        clock.advance(150 * MS);
        assert_eq!(s.poll(clock.now()), TickDecision::Overlap);
    }

    #[test]
    fn slow_tick_skips_missed_deadlines() {
        let clock = ManualClock::new();
        let mut s = IntervalScheduler::new(100 * MS);
        s.begin(clock.now());
        clock.advance(350 * MS);
        // Deadlines at 100, 200 and 300 fell inside the tick.
        assert_eq!(s.finish(clock.now()), 3);
        assert_eq!(s.poll(clock.now()), TickDecision::NotDue(50 * MS));
        assert_eq!(s.skipped(), 3);
    }
}
