//! Deterministic track simulation
//!
//! All spawning logic lives here. This module must stay deterministic:
//! - Explicit per-frame ticks only, no hidden scheduling
//! - Seeded RNG only
//! - Stable iteration order (oldest segment first, lanes left to right)
//! - No rendering or platform dependencies

pub mod curve;
pub mod difficulty;
pub mod entity;
pub mod pool;
pub mod populate;
pub mod segment;
pub mod state;
pub mod track;

pub use curve::{Curve, CurveError, Keyframe};
pub use difficulty::{Difficulty, DifficultyConfig};
pub use entity::{
    Entity, EntityHandle, EntityPool, Ledger, PickupKind, Placeable, TemplateId, TemplateRegistry,
};
pub use pool::{Handle, Pool, Poolable};
pub use populate::{
    ObstacleEntry, PickupEntry, Populator, RandomSource, SpawnConfig, SpawnEntry, select_weighted,
};
pub use segment::{Segment, SegmentHandle, SegmentPool, SegmentTemplate, SegmentTemplateId};
pub use state::{RunPhase, Runner};
pub use track::{Observer, TrackConfig, TrackManager};
