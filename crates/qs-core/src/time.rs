//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter, one tick per
//! interval Δt.  The mapping to seconds-of-day is held in `SimClock`:
//!
//!   secs = start_secs + tick * tick_duration_secs
//!
//! Integer ticks keep all free-flow and spillback arithmetic exact, so two
//! runs over the same input produce the same event sequence.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter (interval index since run start).
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

    /// Ticks elapsed from `earlier` to `self`, zero if `earlier` is later.
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

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and seconds since midnight.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Second-of-day of tick 0.
    pub start_secs: u32,
    /// Interval length Δt in seconds.
    pub tick_duration_secs: u32,
    /// The interval currently being simulated.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_secs: u32, tick_duration_secs: u32) -> Self {
        Self {
            start_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one interval.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick + 1;
    }

    /// Second-of-day at which `tick` begins.
    #[inline]
    pub fn secs_at(&self, tick: Tick) -> u64 {
        self.start_secs as u64 + tick.0 * self.tick_duration_secs as u64
    }

    /// Second-of-day of the current tick.
    #[inline]
    pub fn current_secs(&self) -> u64 {
        self.secs_at(self.current_tick)
    }

    /// First tick whose start is at or after second-of-day `secs`.
    pub fn tick_at_or_after(&self, secs: u32) -> Tick {
        let rel = secs.saturating_sub(self.start_secs) as u64;
        Tick(rel.div_ceil(self.tick_duration_secs as u64))
    }

    /// How many ticks span `secs` seconds (rounds up, so a vehicle is never
    /// released early).
    #[inline]
    pub fn ticks_for_secs(&self, secs: f64) -> u64 {
        (secs / self.tick_duration_secs as f64).ceil().max(0.0) as u64
    }

    /// `(hours, minutes, seconds)` of the current tick.
    pub fn hms(&self) -> (u64, u32, u32) {
        let s = self.current_secs();
        (s / 3_600, ((s % 3_600) / 60) as u32, (s % 60) as u32)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{} ({:02}:{:02}:{:02})", self.current_tick, h, m, s)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level configuration: time window, interval length and seed.
///
/// Traffic-dynamics switches (passing, seepage, stuck time) live in
/// `qs_queue::TrafficDynamics`; flow-tracker thresholds in
/// `qs_flow::TrackerConfig`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Second-of-day at which tick 0 starts.
    pub start_secs: u32,

    /// Second-of-day at which the run stops (exclusive).
    pub end_secs: u32,

    /// Interval length Δt in seconds.  Default: 1.
    pub tick_duration_secs: u32,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count for the `parallel` node phase.  `None` uses all
    /// logical cores.
    pub num_threads: Option<usize>,

    /// Report interval summaries to observers every N ticks.
    pub output_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_secs:            0,
            end_secs:              30 * 3_600,
            tick_duration_secs:    1,
            seed:                  4_711,
            num_threads:           None,
            output_interval_ticks: 1,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        let span = self.end_secs.saturating_sub(self.start_secs) as u64;
        Tick(span.div_ceil(self.tick_duration_secs.max(1) as u64))
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_secs, self.tick_duration_secs)
    }

    /// Reject a zero-length interval or an empty time window.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(CoreError::InconsistentConfiguration(
                "tick_duration_secs must be positive".into(),
            ));
        }
        if self.end_secs <= self.start_secs {
            return Err(CoreError::InconsistentConfiguration(format!(
                "end_secs ({}) must be after start_secs ({})",
                self.end_secs, self.start_secs
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::InconsistentConfiguration(
                "num_threads must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}
