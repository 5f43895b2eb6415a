//! Timestamp type used throughout the service.
//!
//! Timestamps are Unix epoch seconds (UTC). Components never read the wall
//! clock internally; `now` is always passed in so tests can drive time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs` (saturating).
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// This timestamp shifted backward by `secs` (saturating).
    pub fn minus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether a deadline stored as this timestamp has passed at `now`.
    pub fn is_past(&self, now: Timestamp) -> bool {
        self.0 <= now.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_and_minus_are_saturating() {
        assert_eq!(Timestamp::new(u64::MAX).plus_secs(1).as_secs(), u64::MAX);
        assert_eq!(Timestamp::EPOCH.minus_secs(1), Timestamp::EPOCH);
        assert_eq!(Timestamp::new(100).plus_secs(50).as_secs(), 150);
    }

    #[test]
    fn is_past_is_inclusive() {
        let deadline = Timestamp::new(100);
        assert!(!deadline.is_past(Timestamp::new(99)));
        assert!(deadline.is_past(Timestamp::new(100)));
        assert!(deadline.is_past(Timestamp::new(101)));
    }

    #[test]
    fn elapsed_since_saturates() {
        let t = Timestamp::new(100);
        assert_eq!(t.elapsed_since(Timestamp::new(150)), 50);
        assert_eq!(t.elapsed_since(Timestamp::new(50)), 0);
    }
}
