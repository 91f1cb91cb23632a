//! Manually advanced clock
//!
//! Every sleep moves simulated time forward by exactly the requested amount
//! and returns immediately, so timeouts and settle delays run instantly and
//! deterministically.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use sdr_props::Clock;

/// A clock driven by the test rather than the host
///
/// Clones share the same time line.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<Duration>>,
}

impl SimClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Time elapsed since the clock was created, in seconds
    pub fn secs(&self) -> f64 {
        self.now.get().as_secs_f64()
    }
}

impl Clock for SimClock {
    fn elapsed(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_advances() {
        let clock = SimClock::new();
        clock.sleep(Duration::from_millis(250));
        clock.sleep(Duration::from_millis(750));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_clones_share_time() {
        let clock = SimClock::new();
        let other = clock.clone();
        other.advance(Duration::from_millis(1500));
        assert_eq!(clock.secs(), 1.5);
    }
}
