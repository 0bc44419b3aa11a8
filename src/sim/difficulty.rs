//! Difficulty evaluation over elapsed run time
//!
//! The run clock only advances while the run is in [`RunPhase::Running`].
//! The phase is handed in by the caller each frame rather than looked up.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use super::curve::Curve;
use super::state::RunPhase;
use crate::consts::*;

/// The three difficulty curves. A missing curve falls back to a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Forward speed (units/s) over time
    #[serde(default)]
    pub speed: Option<Curve>,
    /// Per-anchor obstacle probability over time
    #[serde(default)]
    pub obstacle_density: Option<Curve>,
    /// Per-anchor pickup probability over time
    #[serde(default)]
    pub pickup_density: Option<Curve>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            speed: Curve::linear(0.0, 10.0, 120.0, 25.0).ok(),
            obstacle_density: Curve::linear(0.0, 0.3, 90.0, 0.7).ok(),
            pickup_density: Curve::linear(0.0, 0.5, 90.0, 0.3).ok(),
        }
    }
}

impl DifficultyConfig {
    /// No curves at all; every accessor returns its fallback
    pub fn empty() -> Self {
        Self {
            speed: None,
            obstacle_density: None,
            pickup_density: None,
        }
    }
}

const WARN_SPEED: u8 = 1 << 0;
const WARN_OBSTACLE: u8 = 1 << 1;
const WARN_PICKUP: u8 = 1 << 2;

/// Maps elapsed run time to speed and spawn densities
#[derive(Debug)]
pub struct Difficulty {
    config: DifficultyConfig,
    elapsed: f32,
    /// Missing-curve warnings already emitted (one per accessor)
    warned: Cell<u8>,
}

impl Difficulty {
    pub fn new(config: DifficultyConfig) -> Self {
        if config.speed.is_none()
            || config.obstacle_density.is_none()
            || config.pickup_density.is_none()
        {
            log::warn!("Difficulty config is missing curves, fallback constants will be used");
        }
        Self {
            config,
            elapsed: 0.0,
            warned: Cell::new(0),
        }
    }

    /// Zero the run clock (run start)
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Add `dt` to the run clock if the run is active
    pub fn advance(&mut self, dt: f32, phase: RunPhase) {
        if phase == RunPhase::Running && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn speed(&self) -> f32 {
        self.sample(self.config.speed.as_ref(), FALLBACK_SPEED, WARN_SPEED, "speed")
    }

    pub fn obstacle_density(&self) -> f32 {
        self.sample(
            self.config.obstacle_density.as_ref(),
            FALLBACK_OBSTACLE_DENSITY,
            WARN_OBSTACLE,
            "obstacle density",
        )
    }

    pub fn pickup_density(&self) -> f32 {
        self.sample(
            self.config.pickup_density.as_ref(),
            FALLBACK_PICKUP_DENSITY,
            WARN_PICKUP,
            "pickup density",
        )
    }

    fn sample(&self, curve: Option<&Curve>, fallback: f32, flag: u8, name: &str) -> f32 {
        match curve {
            Some(curve) => curve.evaluate(self.elapsed),
            None => {
                let warned = self.warned.get();
                if warned & flag == 0 {
                    log::warn!("No {name} curve configured, using fallback {fallback}");
                    self.warned.set(warned | flag);
                }
                fallback
            }
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(DifficultyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed_only(curve: Curve) -> Difficulty {
        Difficulty::new(DifficultyConfig {
            speed: Some(curve),
            ..DifficultyConfig::empty()
        })
    }

    #[test]
    fn test_speed_follows_curve() {
        let mut difficulty = speed_only(Curve::linear(0.0, 10.0, 120.0, 25.0).unwrap());
        difficulty.advance(60.0, RunPhase::Running);
        assert!((difficulty.speed() - 17.5).abs() < 1e-4);

        difficulty.advance(140.0, RunPhase::Running);
        assert_eq!(difficulty.elapsed(), 200.0);
        assert_eq!(difficulty.speed(), 25.0);
    }

    #[test]
    fn test_advance_only_while_running() {
        let mut difficulty = Difficulty::default();
        for phase in [RunPhase::Menu, RunPhase::Paused, RunPhase::GameOver] {
            difficulty.advance(1.0, phase);
        }
        assert_eq!(difficulty.elapsed(), 0.0);

        difficulty.advance(0.5, RunPhase::Running);
        difficulty.advance(-3.0, RunPhase::Running);
        assert_eq!(difficulty.elapsed(), 0.5);

        difficulty.reset();
        assert_eq!(difficulty.elapsed(), 0.0);
    }

    #[test]
    fn test_missing_curves_fall_back() {
        let mut difficulty = Difficulty::new(DifficultyConfig::empty());
        difficulty.advance(30.0, RunPhase::Running);
        assert_eq!(difficulty.speed(), FALLBACK_SPEED);
        assert_eq!(difficulty.obstacle_density(), FALLBACK_OBSTACLE_DENSITY);
        assert_eq!(difficulty.pickup_density(), FALLBACK_PICKUP_DENSITY);
        // Second read takes the already-warned path
        assert_eq!(difficulty.speed(), FALLBACK_SPEED);
    }

    #[test]
    fn test_default_densities() {
        let mut difficulty = Difficulty::default();
        assert!((difficulty.obstacle_density() - 0.3).abs() < 1e-6);
        assert!((difficulty.pickup_density() - 0.5).abs() < 1e-6);
        difficulty.advance(90.0, RunPhase::Running);
        assert!((difficulty.obstacle_density() - 0.7).abs() < 1e-5);
        assert!((difficulty.pickup_density() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_partial_json_section() {
        let config: DifficultyConfig =
            serde_json::from_str(r#"{"speed":[{"time":0,"value":4}]}"#).unwrap();
        let difficulty = Difficulty::new(config);
        assert_eq!(difficulty.speed(), 4.0);
        assert_eq!(difficulty.obstacle_density(), FALLBACK_OBSTACLE_DENSITY);
    }
}
