//! Run phase and the forward-moving runner
//!
//! The runner is the observer the track follows. Jump/slide physics and
//! input decoding live in the host; only forward travel and lane choice
//! are tracked here.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::lane_offsets;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// Title screen, no run in progress
    #[default]
    Menu,
    /// Active gameplay
    Running,
    /// Run is paused
    Paused,
    /// Run ended
    GameOver,
}

/// The player's runner
#[derive(Debug, Clone)]
pub struct Runner {
    /// Forward (z) position
    pub z: f32,
    /// Current lane index (0 = left)
    lane: usize,
    lanes: Vec<f32>,
    /// Distance travelled but not yet reported to the ledger
    unreported: f32,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(LANE_COUNT, LANE_WIDTH)
    }
}

impl Runner {
    pub fn new(lane_count: usize, lane_width: f32) -> Self {
        Self::with_lanes(lane_offsets(lane_count.max(1), lane_width))
    }

    /// Runner over explicit lateral lane positions (left to right)
    pub fn with_lanes(mut lanes: Vec<f32>) -> Self {
        if lanes.is_empty() {
            lanes.push(0.0);
        }
        Self {
            z: 0.0,
            lane: lanes.len() / 2,
            lanes,
            unreported: 0.0,
        }
    }

    /// Back to z = 0 in the centre lane
    pub fn reset_to_start(&mut self) {
        self.z = 0.0;
        self.lane = self.lanes.len() / 2;
        self.unreported = 0.0;
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Jump straight to a lane; out-of-range indices are ignored
    pub fn set_lane(&mut self, lane: usize) -> bool {
        if lane >= self.lanes.len() {
            log::warn!(
                "Invalid lane index {lane}, must be between 0 and {}",
                self.lanes.len() - 1
            );
            return false;
        }
        self.lane = lane;
        true
    }

    pub fn move_left(&mut self) {
        self.lane = self.lane.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.lane = (self.lane + 1).min(self.lanes.len() - 1);
    }

    /// World position (lateral lane offset, ground height, forward z)
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.lanes[self.lane], 0.0, self.z)
    }

    /// Move forward at `speed` for `dt` seconds.
    ///
    /// Returns the batched distance once it reaches the report threshold.
    pub fn advance(&mut self, dt: f32, speed: f32) -> Option<f32> {
        let delta = speed * dt;
        if delta <= 0.0 {
            return None;
        }
        self.z += delta;
        self.unreported += delta;
        if self.unreported >= DISTANCE_REPORT_THRESHOLD {
            let report = self.unreported;
            self.unreported = 0.0;
            Some(report)
        } else {
            None
        }
    }

    /// Hand over whatever distance is still batched, below threshold or not
    pub fn take_unreported(&mut self) -> Option<f32> {
        if self.unreported > 0.0 {
            Some(std::mem::take(&mut self.unreported))
        } else {
            None
        }
    }
}
