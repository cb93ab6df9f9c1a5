//! Simulation [`Time`]: an integer count of base-unit ticks (spec.md §3 "Time").
//!
//! Unlike the superdense (offset + microstep) logical time used by discrete-event
//! reactor runtimes, the co-simulation time-coordination algorithm (spec.md §4.9)
//! operates on a single integer tick count per federate; iteration at a fixed time is
//! tracked out-of-band by the time coordinator (see `fedrt_runtime::iteration`), not by
//! a microstep embedded in the time value itself.

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    #[error("time arithmetic overflowed")]
    Overflow,
}

/// A point in simulation time, represented as an integer count of base-unit ticks
/// (nanoseconds, by convention). Arithmetic saturates at [`Time::MAX`] rather than
/// overflowing or panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Time(i64);

impl Time {
    /// The sentinel `timeZero` value: the start of the simulation.
    pub const ZERO: Self = Self(0);

    /// The sentinel `timeMax` value: "never" / "end of time". Arithmetic on `MAX`
    /// saturates rather than wrapping.
    pub const MAX: Self = Self(i64::MAX);

    /// Construct a `Time` from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// The raw tick count.
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }

    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    pub fn min(self, other: Self) -> Self {
        std::cmp::min(self, other)
    }

    /// Saturating addition; `Time::MAX + anything == Time::MAX`.
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction; never goes below [`Time::ZERO`].
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0).max(0))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_max() {
            write!(f, "timeMax")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<i64> for Time {
    fn from(ticks: i64) -> Self {
        Self(ticks)
    }
}

impl From<Time> for i64 {
    fn from(t: Time) -> Self {
        t.0
    }
}

impl std::ops::Add for Time {
    type Output = Time;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl std::ops::Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Self) -> Self::Output {
        self.saturating_sub(rhs)
    }
}
