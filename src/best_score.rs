//! Best score persistence
//!
//! Stored as a small JSON file next to the game. A missing or unreadable
//! file is treated as "no best score yet".

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted best score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BestScore {
    pub score: u64,
}

impl BestScore {
    /// Default file name used by the native driver
    pub const FILE_NAME: &'static str = "trash_runner_best.json";

    pub fn new(score: u64) -> Self {
        Self { score }
    }

    /// Record `score` if it beats the stored one. Returns true on improvement.
    pub fn submit(&mut self, score: u64) -> bool {
        if score > self.score {
            self.score = score;
            true
        } else {
            false
        }
    }

    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::info!("No best score at {} ({e}), starting fresh", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<BestScore>(&json) {
            Ok(best) => {
                log::info!("Loaded best score {}", best.score);
                best
            }
            Err(e) => {
                log::warn!("Corrupt best score file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Write to `path`; failures are logged, never fatal
    pub fn save(&self, path: &Path) -> bool {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to encode best score: {e}");
                return false;
            }
        };
        match fs::write(path, json) {
            Ok(()) => {
                log::info!("Best score saved ({})", self.score);
                true
            }
            Err(e) => {
                log::warn!("Failed to save best score to {}: {e}", path.display());
                false
            }
        }
    }
}
