//! Data-driven game tuning
//!
//! Every section is optional in JSON; missing sections take the built-in
//! tuning. An explicit `null` spawn section or an empty segment list is
//! honoured and produces an empty or inert track.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::score::ScoreConfig;
use crate::sim::{DifficultyConfig, SegmentTemplate, SpawnConfig, TrackConfig};

#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read
    Io(std::io::Error),
    /// Malformed JSON, or a curve with missing/out-of-order keyframes
    Json(serde_json::Error),
    /// `look_ahead` must be at least 1
    ZeroLookAhead,
    /// A length that must be positive and finite was not
    InvalidLength { what: String, length: f32 },
    /// A spawn or segment weight was negative or not finite
    InvalidWeight { template: String, weight: f32 },
    /// Segment templates disagree on lane count (or have none)
    LaneMismatch {
        template: String,
        lanes: usize,
        expected: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config: {e}"),
            Self::Json(e) => write!(f, "invalid config: {e}"),
            Self::ZeroLookAhead => write!(f, "track.look_ahead must be at least 1"),
            Self::InvalidLength { what, length } => {
                write!(f, "{what} must be a positive length, got {length}")
            }
            Self::InvalidWeight { template, weight } => {
                write!(f, "template '{template}' has invalid weight {weight}")
            }
            Self::LaneMismatch {
                template,
                lanes,
                expected,
            } => write!(
                f,
                "segment template '{template}' has {lanes} lanes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub track: TrackConfig,
    pub segments: Vec<SegmentTemplate>,
    pub spawn: Option<SpawnConfig>,
    pub difficulty: DifficultyConfig,
    pub score: ScoreConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            segments: vec![SegmentTemplate::default()],
            spawn: Some(SpawnConfig::default()),
            difficulty: DifficultyConfig::default(),
            score: ScoreConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.track.look_ahead == 0 {
            return Err(ConfigError::ZeroLookAhead);
        }
        check_length("track.nominal_segment_length", self.track.nominal_segment_length)?;
        if !(self.track.trailing_margin >= 0.0) {
            return Err(ConfigError::InvalidLength {
                what: "track.trailing_margin".to_owned(),
                length: self.track.trailing_margin,
            });
        }

        let expected = self.lane_count();
        for segment in &self.segments {
            check_length(&format!("segment '{}' length", segment.name), segment.length)?;
            check_weight(&segment.name, segment.weight)?;
            let lanes = segment.lane_offsets.len();
            if lanes == 0 || lanes != expected {
                return Err(ConfigError::LaneMismatch {
                    template: segment.name.clone(),
                    lanes,
                    expected,
                });
            }
        }

        if let Some(spawn) = &self.spawn {
            for entry in &spawn.obstacles {
                check_weight(&entry.template, entry.weight)?;
            }
            for entry in &spawn.pickups {
                check_weight(&entry.template, entry.weight)?;
            }
        }
        Ok(())
    }

    /// Lane count shared by all segment templates (from the first one)
    pub fn lane_count(&self) -> usize {
        self.segments
            .first()
            .map_or(crate::consts::LANE_COUNT, |s| s.lane_offsets.len())
    }

    /// Lateral lane positions the runner can occupy
    pub fn lane_offsets(&self) -> Vec<f32> {
        match self.segments.first() {
            Some(segment) if !segment.lane_offsets.is_empty() => segment.lane_offsets.clone(),
            _ => crate::lane_offsets(crate::consts::LANE_COUNT, crate::consts::LANE_WIDTH),
        }
    }
}

fn check_length(what: &str, length: f32) -> Result<(), ConfigError> {
    if length.is_finite() && length > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidLength {
            what: what.to_owned(),
            length,
        })
    }
}

fn check_weight(template: &str, weight: f32) -> Result<(), ConfigError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            template: template.to_owned(),
            weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.track.look_ahead, LOOK_AHEAD_SEGMENTS);
        assert_eq!(config.lane_count(), LANE_COUNT);
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let json = GameConfig::default().to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), GameConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = GameConfig::from_json(
            r#"{
                "track": {"look_ahead": 4, "seed": 9},
                "spawn": null,
                "difficulty": {"speed": [{"time": 0, "value": 12}]}
            }"#,
        )
        .unwrap();
        assert_eq!(config.track.look_ahead, 4);
        assert_eq!(config.track.initial_segments, INITIAL_SEGMENTS);
        assert!(config.spawn.is_none());
        assert!(config.difficulty.speed.is_some());
        assert!(config.difficulty.obstacle_density.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            GameConfig::from_json(r#"{"track": {"look_ahead": 0}}"#),
            Err(ConfigError::ZeroLookAhead)
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"segments": [{"length": -1}]}"#),
            Err(ConfigError::InvalidLength { .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"segments": [{"lane_offsets": [0, 2]}, {"lane_offsets": [0]}]}"#),
            Err(ConfigError::LaneMismatch { lanes: 1, expected: 2, .. })
        ));
        assert!(matches!(
            GameConfig::from_json(
                r#"{"spawn": {"obstacles": [{"template": "x", "weight": -0.5}]}}"#
            ),
            Err(ConfigError::InvalidWeight { .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"difficulty": {"speed": [{"time": 5, "value": 1}, {"time": 1, "value": 2}]}}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(GameConfig::from_json("[1,"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_empty_segment_list_allowed() {
        let config = GameConfig::from_json(r#"{"segments": []}"#).unwrap();
        assert!(config.segments.is_empty());
        assert_eq!(config.lane_offsets().len(), LANE_COUNT);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GameConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("failed to read config"));
    }
}
