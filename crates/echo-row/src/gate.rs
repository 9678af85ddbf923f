// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Admission gate deciding which rotate attempts take effect.
//!
//! The gate is independent of the pivot lock: it is consulted first, and only
//! an admitted attempt goes on to take the lock. Both modes are lock-free.
//!
//! - [`Throttle::Interval`] keeps the timestamp of the last admitted attempt in
//!   an atomic and admits through a compare-and-swap, so among a burst of
//!   concurrent callers inside one interval exactly one wins.
//! - [`Throttle::EveryNth`] numbers attempts with an atomic counter and admits
//!   attempt numbers divisible by `n`.
//!
//! In both modes the very first attempt is admitted.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::RowError;

/// Minimum spacing between effective rotations when nothing else is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// `last_admitted` value meaning "nothing admitted yet". Stamps are offset by
/// one nanosecond so a real stamp never collides with it.
const NEVER: u64 = 0;

/// Throttle policy for [`Row::rotate`](crate::Row::rotate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    /// At most one effective rotation per interval. `Duration::ZERO` removes
    /// the gate: every attempt is effective.
    Interval(Duration),
    /// Attempts 1, n+1, 2n+1, … are effective, regardless of elapsed time.
    EveryNth(NonZeroU64),
}

impl Throttle {
    /// Every attempt is effective.
    pub const fn unthrottled() -> Self {
        Self::Interval(Duration::ZERO)
    }

    /// Interval mode from a signed millisecond count.
    ///
    /// Zero means unthrottled; negative values are rejected.
    pub fn from_millis(millis: i64) -> Result<Self, RowError> {
        let millis = u64::try_from(millis).map_err(|_| {
            RowError::InvalidConfiguration(format!("negative rotation interval: {millis}ms"))
        })?;
        Ok(Self::Interval(Duration::from_millis(millis)))
    }

    /// Count mode. `n == 0` is rejected.
    pub fn every_nth(n: u64) -> Result<Self, RowError> {
        NonZeroU64::new(n).map(Self::EveryNth).ok_or_else(|| {
            RowError::InvalidConfiguration("every_nth must be at least 1".to_owned())
        })
    }

    /// `true` when every attempt is admitted.
    pub fn is_unthrottled(&self) -> bool {
        match self {
            Self::Interval(interval) => interval.is_zero(),
            Self::EveryNth(n) => n.get() == 1,
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::Interval(DEFAULT_INTERVAL)
    }
}

/// Race-free admission gate for a single [`Throttle`].
#[derive(Debug)]
pub struct RateGate {
    throttle: Throttle,
    origin: Instant,
    last_admitted: AtomicU64,
    attempts: AtomicU64,
}

impl RateGate {
    /// Create a gate that has not seen any attempt yet.
    pub fn new(throttle: Throttle) -> Self {
        Self {
            throttle,
            origin: Instant::now(),
            last_admitted: AtomicU64::new(NEVER),
            attempts: AtomicU64::new(0),
        }
    }

    /// The policy this gate enforces.
    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// Total attempts seen so far, admitted or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Decide whether the calling attempt is effective.
    ///
    /// Linearizable: concurrent callers are admitted exactly as if they had
    /// arrived one at a time in some order.
    pub fn admit(&self) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel);
        match self.throttle {
            Throttle::EveryNth(n) => attempt % n.get() == 0,
            Throttle::Interval(interval) if interval.is_zero() => true,
            Throttle::Interval(interval) => self.admit_interval(interval),
        }
    }

    fn admit_interval(&self, interval: Duration) -> bool {
        let interval = saturating_nanos(interval);
        let now = saturating_nanos(self.origin.elapsed()).saturating_add(1);
        let mut last = self.last_admitted.load(Ordering::Acquire);
        loop {
            // A stamp newer than ours also lands here (saturating_sub == 0).
            if last != NEVER && now.saturating_sub(last) < interval {
                return false;
            }
            match self.last_admitted.compare_exchange_weak(
                last,
                now,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => last = actual,
            }
        }
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn burst(gate: &RateGate, callers: usize) -> usize {
        let admitted = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..callers {
                scope.spawn(|| {
                    if gate.admit() {
                        admitted.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        admitted.into_inner()
    }

    #[test]
    fn first_attempt_is_always_admitted() {
        assert!(RateGate::new(Throttle::Interval(Duration::from_secs(3600))).admit());
        assert!(RateGate::new(Throttle::every_nth(5).unwrap()).admit());
        assert!(RateGate::new(Throttle::default()).admit());
    }

    #[test]
    fn burst_inside_interval_admits_exactly_one() {
        let gate = RateGate::new(Throttle::Interval(Duration::from_secs(1)));
        assert_eq!(burst(&gate, 64), 1);
        assert_eq!(gate.attempts(), 64);
    }

    #[test]
    fn interval_reopens_after_elapsing() {
        let gate = RateGate::new(Throttle::Interval(Duration::from_millis(20)));
        assert!(gate.admit());
        assert!(!gate.admit());
        thread::sleep(Duration::from_millis(40));
        assert!(gate.admit());
        assert!(!gate.admit());
    }

    #[test]
    fn zero_interval_admits_everything() {
        let gate = RateGate::new(Throttle::unthrottled());
        assert_eq!(burst(&gate, 50), 50);
    }

    #[test]
    fn every_nth_admits_by_count() {
        let gate = RateGate::new(Throttle::every_nth(3).unwrap());
        let pattern: Vec<bool> = (0..7).map(|_| gate.admit()).collect();
        assert_eq!(pattern, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn every_nth_under_concurrency() {
        let gate = RateGate::new(Throttle::every_nth(3).unwrap());
        assert_eq!(burst(&gate, 30), 10);
    }

    #[test]
    fn negative_interval_is_invalid() {
        let err = Throttle::from_millis(-1).unwrap_err();
        assert!(matches!(err, RowError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_millis_is_unthrottled() {
        let throttle = Throttle::from_millis(0).unwrap();
        assert!(throttle.is_unthrottled());
        assert_eq!(throttle, Throttle::unthrottled());
    }

    #[test]
    fn every_zeroth_is_invalid() {
        assert!(matches!(
            Throttle::every_nth(0),
            Err(RowError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn default_is_hundred_millis() {
        assert_eq!(Throttle::default(), Throttle::Interval(DEFAULT_INTERVAL));
        assert!(!Throttle::default().is_unthrottled());
    }
}
