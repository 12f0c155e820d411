//! Time management utilities
//!
//! Wall-clock sources for the main loop and the fixed-timestep accumulator that
//! turns variable real-time deltas into a whole number of simulation steps.

use std::collections::VecDeque;
use std::time::Instant;

/// Source of wall-clock deltas for the main loop
///
/// The engine asks for one delta per outer tick. Implementations must never
/// return a negative delta.
pub trait Clock {
    /// Seconds elapsed since the previous call (or since the last reset)
    fn delta_seconds(&mut self) -> f64;

    /// Restart measurement from "now"
    fn reset(&mut self) {}
}

/// High-precision clock backed by [`Instant`]
pub struct SystemClock {
    last_tick: Instant,
    total_time: f64,
    tick_count: u64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Total seconds measured since creation or the last reset
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of deltas handed out
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Clock for SystemClock {
    fn delta_seconds(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        self.total_time += delta;
        self.tick_count += 1;
        delta
    }

    fn reset(&mut self) {
        self.last_tick = Instant::now();
        self.total_time = 0.0;
        self.tick_count = 0;
    }
}

/// Clock that replays a fixed sequence of deltas
///
/// Used by headless runs and tests to make the main loop deterministic. Once the
/// script is exhausted the fallback delta is returned forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClock {
    deltas: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedClock {
    /// Create a clock replaying `deltas` (seconds), then returning zero
    pub fn new(deltas: impl IntoIterator<Item = f64>) -> Self {
        Self {
            deltas: deltas.into_iter().collect(),
            fallback: 0.0,
        }
    }

    /// Delta returned once the script runs out
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback.max(0.0);
        self
    }

    /// Append more deltas to the script
    pub fn push(&mut self, delta: f64) {
        self.deltas.push_back(delta);
    }

    /// Number of scripted deltas not yet consumed
    pub fn remaining(&self) -> usize {
        self.deltas.len()
    }
}

impl Clock for ScriptedClock {
    fn delta_seconds(&mut self) -> f64 {
        self.deltas.pop_front().unwrap_or(self.fallback).max(0.0)
    }
}

/// Fixed-timestep accumulator
///
/// Real time is added with [`accumulate`](Self::accumulate); every call to
/// [`try_consume_step`](Self::try_consume_step) that returns `true` stands for
/// one simulation step of exactly [`frame_time`](Self::frame_time) seconds.
/// Without a clamp, `unprocessed_time == total_elapsed - steps * frame_time`.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    frame_time: f64,
    unprocessed_time: f64,
    max_unprocessed_time: Option<f64>,
    total_elapsed: f64,
    total_steps: u64,
    discarded_time: f64,
}

impl FixedTimestep {
    /// Create an accumulator for `target_ups` simulation updates per second
    pub fn new(target_ups: u32) -> Self {
        Self::from_frame_time(1.0 / f64::from(target_ups.max(1)))
    }

    /// Create an accumulator with an explicit step length in seconds
    pub fn from_frame_time(frame_time: f64) -> Self {
        Self {
            frame_time,
            unprocessed_time: 0.0,
            max_unprocessed_time: None,
            total_elapsed: 0.0,
            total_steps: 0,
            discarded_time: 0.0,
        }
    }

    /// Cap the backlog of unprocessed time (`None` disables the cap)
    pub fn with_max_unprocessed_time(mut self, max: Option<f64>) -> Self {
        self.max_unprocessed_time = max;
        self
    }

    /// Add a wall-clock delta to the backlog
    ///
    /// Returns the amount of time thrown away by the clamp, if any.
    pub fn accumulate(&mut self, delta: f64) -> f64 {
        let delta = if delta.is_finite() && delta > 0.0 { delta } else { 0.0 };
        self.total_elapsed += delta;
        self.unprocessed_time += delta;

        match self.max_unprocessed_time {
            Some(max) if self.unprocessed_time > max => {
                let excess = self.unprocessed_time - max;
                self.unprocessed_time = max;
                self.discarded_time += excess;
                excess
            }
            _ => 0.0,
        }
    }

    /// Consume one step from the backlog if more than one step is pending
    pub fn try_consume_step(&mut self) -> bool {
        if self.unprocessed_time > self.frame_time {
            self.unprocessed_time -= self.frame_time;
            self.total_steps += 1;
            true
        } else {
            false
        }
    }

    /// Seconds per simulation step
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Backlog of real time not yet simulated
    pub fn unprocessed_time(&self) -> f64 {
        self.unprocessed_time
    }

    /// Total real time fed in, including clamped time
    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    /// Total simulation steps consumed
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Real time dropped by the backlog cap
    pub fn discarded_time(&self) -> f64 {
        self.discarded_time
    }

    /// Fraction of a step left in the backlog, in `[0, 1]`
    pub fn alpha(&self) -> f64 {
        (self.unprocessed_time / self.frame_time).clamp(0.0, 1.0)
    }

    /// Drop any backlog (used when the loop restarts measuring time)
    pub fn clear_backlog(&mut self) {
        self.unprocessed_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sixty_hz_scenario() {
        let mut timestep = FixedTimestep::new(60);
        let mut steps_per_tick = Vec::new();

        for delta in [0.04, 0.0, 0.02] {
            timestep.accumulate(delta);
            let mut steps = 0;
            while timestep.try_consume_step() {
                steps += 1;
            }
            steps_per_tick.push(steps);
        }

        assert_eq!(steps_per_tick, vec![2, 0, 1]);
        assert_relative_eq!(timestep.unprocessed_time(), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_accumulator_conservation() {
        let mut timestep = FixedTimestep::from_frame_time(0.01);
        let deltas = [0.003, 0.027, 0.1, 0.0, 0.0049, 0.05, 0.2];

        for delta in deltas {
            timestep.accumulate(delta);
            while timestep.try_consume_step() {}
        }

        let total: f64 = deltas.iter().sum();
        let expected_steps = (total / 0.01).floor();
        let steps = timestep.total_steps() as f64;
        assert!((steps - expected_steps).abs() <= 1.0);
        assert_relative_eq!(
            timestep.unprocessed_time(),
            total - steps * 0.01,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_clamp_discards_backlog() {
        let mut timestep = FixedTimestep::new(100).with_max_unprocessed_time(Some(0.05));
        let discarded = timestep.accumulate(2.0);

        assert_relative_eq!(discarded, 1.95, epsilon = 1e-9);
        assert_relative_eq!(timestep.unprocessed_time(), 0.05, epsilon = 1e-9);

        let mut steps = 0;
        while timestep.try_consume_step() {
            steps += 1;
        }
        assert!(steps <= 5);
    }

    #[test]
    fn test_invalid_deltas_are_ignored() {
        let mut timestep = FixedTimestep::new(60);
        timestep.accumulate(-1.0);
        timestep.accumulate(f64::NAN);
        assert_eq!(timestep.unprocessed_time(), 0.0);
        assert!(!timestep.try_consume_step());
    }

    #[test]
    fn test_scripted_clock_replays_then_falls_back() {
        let mut clock = ScriptedClock::new([0.1, 0.2]).with_fallback(0.5);
        assert_eq!(clock.delta_seconds(), 0.1);
        assert_eq!(clock.delta_seconds(), 0.2);
        assert_eq!(clock.remaining(), 0);
        assert_eq!(clock.delta_seconds(), 0.5);
    }
}
