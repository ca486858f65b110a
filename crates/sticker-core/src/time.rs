use serde::{Deserialize, Serialize};
use std::fmt;

/// Speed multipliers offered by the preview transport.
pub const DEFAULT_SPEEDS: [f64; 4] = [1.0, 1.5, 2.0, 3.0];

/// A speed multiplier selected from a fixed, small set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSpeed {
    steps: Vec<f64>,
    index: usize,
}

impl PlaybackSpeed {
    /// Build from a list of steps. An empty list falls back to the defaults.
    pub fn new(steps: Vec<f64>) -> Self {
        let steps: Vec<f64> = steps.into_iter().filter(|s| *s > 0.0).collect();
        let steps = if steps.is_empty() {
            DEFAULT_SPEEDS.to_vec()
        } else {
            steps
        };
        Self { steps, index: 0 }
    }

    pub fn multiplier(&self) -> f64 {
        self.steps[self.index]
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    /// Advance to the next step, wrapping to the first.
    pub fn cycle(&mut self) -> f64 {
        self.index = (self.index + 1) % self.steps.len();
        self.multiplier()
    }

    /// Select the step equal to `multiplier`. Returns false (and leaves the
    /// selection unchanged) when it is not one of the steps.
    pub fn select(&mut self, multiplier: f64) -> bool {
        match self
            .steps
            .iter()
            .position(|s| (s - multiplier).abs() < f64::EPSILON)
        {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::new(DEFAULT_SPEEDS.to_vec())
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// The monotonic clock that drives animation and media rotation.
///
/// The live preview owns one instance; every export pass builds its own so
/// that exporting never disturbs what is on screen.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    elapsed: f64,
    speed: PlaybackSpeed,
    running: bool,
}

impl PlaybackClock {
    pub fn new(speed: PlaybackSpeed) -> Self {
        Self {
            elapsed: 0.0,
            speed,
            running: false,
        }
    }

    /// Elapsed clock time in seconds-equivalent units.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Jump to an absolute time. Used by export passes, which place the clock
    /// at `frame / fps` rather than accumulating increments.
    pub fn set_elapsed(&mut self, t: f64) {
        self.elapsed = t.max(0.0);
    }

    /// Advance by `base × speed` and return the applied delta.
    pub fn advance(&mut self, base: f64) -> f64 {
        let delta = base * self.speed.multiplier();
        self.elapsed += delta;
        delta
    }

    pub fn speed(&self) -> f64 {
        self.speed.multiplier()
    }

    pub fn speed_control(&self) -> &PlaybackSpeed {
        &self.speed
    }

    pub fn speed_control_mut(&mut self) -> &mut PlaybackSpeed {
        &mut self.speed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_cycles_and_wraps() {
        let mut speed = PlaybackSpeed::default();
        assert_eq!(speed.multiplier(), 1.0);
        assert_eq!(speed.cycle(), 1.5);
        assert_eq!(speed.cycle(), 2.0);
        assert_eq!(speed.cycle(), 3.0);
        assert_eq!(speed.cycle(), 1.0);
    }

    #[test]
    fn test_speed_select_rejects_unknown() {
        let mut speed = PlaybackSpeed::default();
        assert!(speed.select(2.0));
        assert!(!speed.select(2.5));
        assert_eq!(speed.multiplier(), 2.0);
    }

    #[test]
    fn test_empty_steps_fall_back() {
        assert_eq!(PlaybackSpeed::new(vec![]).steps(), &DEFAULT_SPEEDS);
    }

    #[test]
    fn test_clock_advance_scales_by_speed() {
        let mut clock = PlaybackClock::default();
        clock.speed_control_mut().select(2.0);
        let delta = clock.advance(0.05);
        assert!((delta - 0.1).abs() < 1e-12);
        assert!((clock.elapsed() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_clock_display_speed() {
        let clock = PlaybackClock::default();
        assert_eq!(clock.speed_control().to_string(), "1x");
    }
}
