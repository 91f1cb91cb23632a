//! Device time values and the host clock seam
//!
//! [`TimeSpec`] keeps whole and fractional seconds apart so that large device
//! times do not lose sub-microsecond resolution. [`Clock`] abstracts host-side
//! waiting so that polling loops can be driven by a simulated clock in tests.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::{Duration, Instant};

/// A device time: whole seconds plus a fractional second in `[0, 1)`
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSpec {
    full_secs: i64,
    frac_secs: f64,
}

impl TimeSpec {
    /// Create a time from whole and fractional seconds (normalized)
    pub fn new(full_secs: i64, frac_secs: f64) -> Self {
        let carry = frac_secs.floor();
        let mut full_secs = full_secs + carry as i64;
        let mut frac_secs = frac_secs - carry;
        // floor() can leave exactly 1.0 behind after rounding
        if frac_secs >= 1.0 {
            full_secs += 1;
            frac_secs -= 1.0;
        }
        Self {
            full_secs,
            frac_secs,
        }
    }

    /// Create a time from real seconds
    pub fn from_secs(secs: f64) -> Self {
        let full = secs.floor();
        Self::new(full as i64, secs - full)
    }

    /// Create a time from a host duration
    pub fn from_duration(duration: Duration) -> Self {
        Self::new(
            duration.as_secs() as i64,
            f64::from(duration.subsec_nanos()) / 1e9,
        )
    }

    /// Whole seconds
    pub fn full_secs(&self) -> i64 {
        self.full_secs
    }

    /// Fractional seconds in `[0, 1)`
    pub fn frac_secs(&self) -> f64 {
        self.frac_secs
    }

    /// Time as real seconds (may lose precision for large values)
    pub fn real_secs(&self) -> f64 {
        self.full_secs as f64 + self.frac_secs
    }
}

impl Add for TimeSpec {
    type Output = TimeSpec;

    fn add(self, rhs: TimeSpec) -> TimeSpec {
        TimeSpec::new(
            self.full_secs + rhs.full_secs,
            self.frac_secs + rhs.frac_secs,
        )
    }
}

impl Sub for TimeSpec {
    type Output = TimeSpec;

    fn sub(self, rhs: TimeSpec) -> TimeSpec {
        TimeSpec::new(
            self.full_secs - rhs.full_secs,
            self.frac_secs - rhs.frac_secs,
        )
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} s", self.real_secs())
    }
}

/// Host-side clock used for bounded polling and fixed settle delays
pub trait Clock {
    /// Monotonic time elapsed since an arbitrary, fixed epoch
    fn elapsed(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by `std::time::Instant` and `std::thread::sleep`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is now
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalizes_fraction() {
        let t = TimeSpec::new(1, 1.25);
        assert_eq!(t.full_secs(), 2);
        assert!((t.frac_secs() - 0.25).abs() < 1e-12);

        let t = TimeSpec::new(1, -0.25);
        assert_eq!(t.full_secs(), 0);
        assert!((t.frac_secs() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_ordering() {
        let a = TimeSpec::new(10, 0.5);
        let b = TimeSpec::new(10, 0.505);
        let c = TimeSpec::new(11, 0.0);
        assert!(a < b);
        assert!(b < c);
        assert!((b - a) < TimeSpec::from_secs(0.01));
        assert!(a - b < TimeSpec::default());
    }

    #[test]
    fn test_from_duration() {
        let t = TimeSpec::from_duration(Duration::from_millis(2500));
        assert_eq!(t.full_secs(), 2);
        assert!((t.frac_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let before = clock.elapsed();
        clock.sleep(Duration::from_millis(2));
        assert!(clock.elapsed() > before);
    }

    proptest! {
        #[test]
        fn frac_always_normalized(full in -1_000_000i64..1_000_000, frac in -50.0f64..50.0) {
            let t = TimeSpec::new(full, frac);
            prop_assert!(t.frac_secs() >= 0.0);
            prop_assert!(t.frac_secs() < 1.0);
        }

        #[test]
        fn add_then_sub_is_identity(a in 0.0f64..1e6, b in 0.0f64..1e6) {
            let ta = TimeSpec::from_secs(a);
            let tb = TimeSpec::from_secs(b);
            let back = (ta + tb) - tb;
            prop_assert!((back.real_secs() - ta.real_secs()).abs() < 1e-6);
        }
    }
}
