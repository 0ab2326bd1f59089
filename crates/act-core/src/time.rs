//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter.  One tick is one
//! decision/apply cycle: every agent's current activity is polled at most
//! once per tick and at most one action per agent is executed.
//!
//! `SimClock` maps ticks onto a day cycle so behaviors can ask for the time
//! of day (shift hours, meal times) without a datetime library.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Current tick plus the length of a simulated day.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Ticks in one simulated day.  Never zero.
    pub ticks_per_day: u64,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(ticks_per_day: u64) -> Self {
        Self { ticks_per_day: ticks_per_day.max(1), current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Zero-based day number.
    #[inline]
    pub fn day(&self) -> u64 {
        self.current_tick.0 / self.ticks_per_day
    }

    /// Fraction of the current day elapsed, in `[0.0, 1.0)`.
    #[inline]
    pub fn time_of_day(&self) -> f32 {
        (self.current_tick.0 % self.ticks_per_day) as f32 / self.ticks_per_day as f32
    }

    /// Hour of the day in `[0, 24)`.
    #[inline]
    pub fn hour(&self) -> u32 {
        (self.time_of_day() * 24.0) as u32
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (day {} {:02}h)", self.current_tick, self.day(), self.hour())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Loaded from TOML by the application crate (enable the `serde` feature)
/// or built in code.  Every field has a default so partial files work.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Ticks in one simulated day.
    pub ticks_per_day: u64,

    /// Worker thread count for the parallel decision phase.  `None` uses
    /// all logical cores.
    pub num_threads: Option<usize>,

    /// Chebyshev radius (tiles) within which agents see other agents,
    /// facilities and storages.
    pub perception_radius: u32,

    /// Ticks after which a remembered storage observation is forgotten.
    pub memory_expiry_ticks: u64,

    /// Consecutive ticks without progress after which navigation gives up.
    pub max_stuck_ticks: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed:                42,
            total_ticks:         1_000,
            ticks_per_day:       1_440,
            num_threads:         None,
            perception_radius:   8,
            memory_expiry_ticks: 2_880,
            max_stuck_ticks:     20,
        }
    }
}

impl SimConfig {
    /// Tick at which [`SimClock`] stops the run.
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.ticks_per_day)
    }

    /// Reject values that would make the loop or navigation degenerate.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ticks_per_day == 0 {
            return Err(CoreError::Config("ticks_per_day must be > 0".into()));
        }
        if self.max_stuck_ticks == 0 {
            return Err(CoreError::Config("max_stuck_ticks must be > 0".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be > 0 when set".into()));
        }
        Ok(())
    }
}
