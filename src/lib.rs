//! Trash Runner - endless runner track core
//!
//! Core modules:
//! - `sim`: Deterministic track simulation (pools, segments, spawning, difficulty)
//! - `score`: Score/lives ledger with ordered subscribers
//! - `run`: Run lifecycle controller driven by the host loop
//! - `config`: Data-driven tuning loaded from JSON
//! - `audio`: Audio cue sinks
//! - `best_score`: Persisted best score

pub mod audio;
pub mod best_score;
pub mod config;
pub mod run;
pub mod score;
pub mod sim;

pub use best_score::BestScore;
pub use config::{ConfigError, GameConfig};
pub use run::{RunController, RunEvent, RunPhase};
pub use score::{ScoreEvent, ScoreLedger};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Difficulty fallbacks when a curve is missing
    pub const FALLBACK_SPEED: f32 = 10.0;
    pub const FALLBACK_OBSTACLE_DENSITY: f32 = 0.3;
    pub const FALLBACK_PICKUP_DENSITY: f32 = 0.5;

    /// Track window defaults
    pub const INITIAL_SEGMENTS: usize = 5;
    pub const LOOK_AHEAD_SEGMENTS: usize = 3;
    pub const NOMINAL_SEGMENT_LENGTH: f32 = 10.0;
    /// Distance behind the observer before a segment is recycled
    pub const TRAILING_MARGIN: f32 = 20.0;
    /// Extra segments pre-warmed beyond the initial run
    pub const SEGMENT_POOL_SLACK: usize = 5;

    /// Pool pre-warm counts per declared template
    pub const OBSTACLE_WARM_COUNT: usize = 10;
    pub const PICKUP_WARM_COUNT: usize = 15;

    /// Lane layout (0 = left, 1 = center, 2 = right)
    pub const LANE_COUNT: usize = 3;
    pub const LANE_WIDTH: f32 = 3.0;
    pub const CENTER_LANE: usize = 1;

    /// Default minimum spacing declared on spawn entries
    pub const OBSTACLE_MIN_SPACING: f32 = 5.0;
    pub const PICKUP_MIN_SPACING: f32 = 3.0;

    /// Scoring
    pub const SCORE_PER_METER: u64 = 1;
    pub const SCORE_PER_COIN: u64 = 10;
    pub const SCORE_PER_TRASH: u64 = 25;
    pub const INITIAL_LIVES: u32 = 3;
    /// Runner batches distance before reporting it to the ledger
    pub const DISTANCE_REPORT_THRESHOLD: f32 = 0.5;
}

/// Lateral offsets for `count` lanes centred on x = 0
pub fn lane_offsets(count: usize, width: f32) -> Vec<f32> {
    let center = (count as f32 - 1.0) / 2.0;
    (0..count).map(|i| (i as f32 - center) * width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_offsets_centered() {
        assert_eq!(lane_offsets(3, 3.0), vec![-3.0, 0.0, 3.0]);
        assert_eq!(lane_offsets(1, 3.0), vec![0.0]);
        assert!(lane_offsets(0, 3.0).is_empty());
    }
}
