//! Fixed-interval tick scheduling.
//!
//! The engine never spawns a timer of its own. The host reports elapsed
//! time and the [`TickClock`] converts it into whole tick cycles, carrying
//! the remainder forward. Stopping the clock is the cancellation.

use std::time::Duration;

/// One tick per second.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Accumulating fixed-delay clock.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    /// Elapsed time not yet converted into a tick.
    accumulator: Duration,
    running: bool,
}

impl TickClock {
    /// A zero interval is clamped to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulator: Duration::ZERO,
            running: true,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Time accumulated towards the next tick.
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Add elapsed time and return how many ticks fell due. Always zero once
    /// stopped.
    pub fn accumulate(&mut self, elapsed: Duration) -> u64 {
        if !self.running {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(elapsed);
        let interval = self.interval.as_nanos();
        let due = self.accumulator.as_nanos() / interval;
        self.accumulator = Duration::from_nanos((self.accumulator.as_nanos() % interval) as u64);
        u64::try_from(due).unwrap_or(u64::MAX)
    }

    /// Stop the clock. Returns `true` only for the call that stopped it.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.accumulator = Duration::ZERO;
        was_running
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_intervals_become_ticks() {
        let mut clock = TickClock::default();
        assert_eq!(clock.accumulate(Duration::from_millis(2500)), 2);
        assert_eq!(clock.pending(), Duration::from_millis(500));
    }

    #[test]
    fn remainder_carries_forward() {
        let mut clock = TickClock::default();
        assert_eq!(clock.accumulate(Duration::from_millis(600)), 0);
        assert_eq!(clock.accumulate(Duration::from_millis(600)), 1);
        assert_eq!(clock.pending(), Duration::from_millis(200));
    }

    #[test]
    fn stopped_clock_never_ticks() {
        let mut clock = TickClock::default();
        assert!(clock.stop());
        assert!(!clock.stop());
        assert!(!clock.is_running());
        assert_eq!(clock.accumulate(Duration::from_secs(10)), 0);
    }

    #[test]
    fn oversized_elapsed_saturates() {
        let mut clock = TickClock::default();
        assert_eq!(clock.accumulate(Duration::from_millis(600)), 0);
        assert_eq!(clock.accumulate(Duration::MAX), u64::MAX);
        assert!(clock.pending() < clock.interval());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let clock = TickClock::new(Duration::ZERO);
        assert_eq!(clock.interval(), Duration::from_millis(1));
    }
}
