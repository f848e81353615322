//! Microsecond wait timeouts.
//!
//! A [`Timeout`] is stored as a plain microsecond count so it fits in a single
//! atomic. It is split into whole seconds and a sub-second remainder when it
//! is turned into a [`Duration`] or an absolute deadline.

use crate::{MICROS_PER_SECOND, NANOS_PER_MICRO};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Wait interval with microsecond granularity.
///
/// Zero is legal and means "wake immediately".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timeout {
    micros: u64,
}

impl Timeout {
    /// Zero-length timeout.
    pub const ZERO: Self = Self::from_micros(0);

    /// Create a timeout from microseconds.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Create a timeout from milliseconds, saturating on overflow.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::from_micros(millis.saturating_mul(1_000))
    }

    /// Total length in microseconds.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.micros
    }

    /// Whole seconds part.
    #[inline]
    #[must_use]
    pub const fn whole_seconds(self) -> u64 {
        self.micros / MICROS_PER_SECOND
    }

    /// Microseconds left over after the whole seconds, always below one million.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "remainder is below 1_000_000"
    )]
    pub const fn subsec_micros(self) -> u32 {
        (self.micros % MICROS_PER_SECOND) as u32
    }

    /// Sub-second remainder at nanosecond resolution.
    #[inline]
    #[must_use]
    pub const fn subsec_nanos(self) -> u32 {
        self.subsec_micros() * NANOS_PER_MICRO
    }

    /// Whether this timeout is zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.micros == 0
    }

    /// Convert to a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::new(self.whole_seconds(), self.subsec_nanos())
    }

    /// Absolute deadline `now + self` on the monotonic clock.
    ///
    /// Seconds and nanoseconds are added separately; `Instant` carries the
    /// nanosecond overflow into seconds. Returns `None` if the deadline is not
    /// representable, which callers treat as "no deadline".
    #[must_use]
    pub fn deadline_from(self, now: Instant) -> Option<Instant> {
        now.checked_add(Duration::from_secs(self.whole_seconds()))?
            .checked_add(Duration::from_nanos(u64::from(self.subsec_nanos())))
    }
}

impl From<u64> for Timeout {
    fn from(micros: u64) -> Self {
        Self::from_micros(micros)
    }
}

impl From<Duration> for Timeout {
    /// Truncates to whole microseconds, saturating at `u64::MAX`.
    fn from(duration: Duration) -> Self {
        Self::from_micros(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }
}

impl From<Timeout> for Duration {
    fn from(timeout: Timeout) -> Self {
        timeout.as_duration()
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.micros)
    }
}
