//! Endless track: spawns segments ahead of the observer, recycles behind
//!
//! The active window is ordered by ascending start position and contiguous:
//! every segment starts where the previous one ends. Segments are only ever
//! appended at the frontier and removed from the oldest end, so that order
//! holds without sorting.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use super::entity::{Entity, EntityHandle, EntityPool, Ledger, TemplateRegistry};
use super::populate::{Populator, RandomSource, SpawnConfig, select_weighted};
use super::segment::{Segment, SegmentHandle, SegmentPool, SegmentTemplate, SegmentTemplateId};
use crate::audio::AudioSink;
use crate::consts::*;

/// Window sizing and pool warm-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Segments placed at run start
    pub initial_segments: usize,
    /// Minimum segments kept in the window, and reach ahead in nominal lengths
    pub look_ahead: usize,
    pub nominal_segment_length: f32,
    /// How far behind the observer a segment's rear edge may fall before it is
    /// recycled. The observer must also have left the segment.
    pub trailing_margin: f32,
    /// Extra segments pre-warmed beyond `initial_segments`
    pub segment_pool_slack: usize,
    pub obstacle_warm_count: usize,
    pub pickup_warm_count: usize,
    /// Spawn RNG seed
    pub seed: u64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            initial_segments: INITIAL_SEGMENTS,
            look_ahead: LOOK_AHEAD_SEGMENTS,
            nominal_segment_length: NOMINAL_SEGMENT_LENGTH,
            trailing_margin: TRAILING_MARGIN,
            segment_pool_slack: SEGMENT_POOL_SLACK,
            obstacle_warm_count: OBSTACLE_WARM_COUNT,
            pickup_warm_count: PICKUP_WARM_COUNT,
            seed: 0x5eed,
        }
    }
}

/// Shared position source the track follows.
///
/// The runner writes it, the track reads it on [`TrackManager::update`].
#[derive(Debug, Clone, Default)]
pub struct Observer(Rc<Cell<Vec3>>);

impl Observer {
    pub fn new(position: Vec3) -> Self {
        Self(Rc::new(Cell::new(position)))
    }

    pub fn set(&self, position: Vec3) {
        self.0.set(position);
    }

    pub fn get(&self) -> Vec3 {
        self.0.get()
    }
}

pub struct TrackManager {
    config: TrackConfig,
    /// Usable segment templates; empty means the track is inert
    templates: Vec<SegmentTemplate>,
    registry: TemplateRegistry,
    populator: Populator,
    segments: SegmentPool,
    entities: EntityPool,
    /// Placed segments, oldest first
    active: VecDeque<SegmentHandle>,
    /// Where the next segment will start
    frontier_z: f32,
    rng: Pcg32,
    observer: Option<Observer>,
    warmed: bool,
}

impl TrackManager {
    /// Build a track. Invalid or missing segment templates leave it inert;
    /// a missing spawn config leaves every segment empty.
    pub fn new(
        config: TrackConfig,
        templates: Vec<SegmentTemplate>,
        spawn: Option<&SpawnConfig>,
    ) -> Self {
        let templates: Vec<SegmentTemplate> = templates
            .into_iter()
            .filter(|t| {
                let ok = t.length.is_finite() && t.length > 0.0;
                if !ok {
                    log::error!("Segment template '{}' has invalid length {}, skipped", t.name, t.length);
                }
                ok
            })
            .take(u16::MAX as usize)
            .collect();
        if templates.is_empty() {
            log::error!("No segment template assigned, track will not spawn");
        }

        let mut registry = TemplateRegistry::new();
        let populator = match spawn {
            Some(spawn) => Populator::new(spawn, &mut registry),
            None => {
                log::warn!("No spawn config assigned, segments will be empty");
                Populator::default()
            }
        };

        let mut active = VecDeque::new();
        active.reserve(config.initial_segments.max(config.look_ahead) * 2);

        Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            templates,
            registry,
            populator,
            segments: SegmentPool::new(),
            entities: EntityPool::new(),
            active,
            frontier_z: 0.0,
            observer: None,
            warmed: false,
        }
    }

    /// Pre-warm pools and place the initial run from z = 0
    pub fn initialize(&mut self, difficulty: &Difficulty) {
        self.reset_track(difficulty);
        log::info!(
            "Track initialized: {} segments, frontier {}",
            self.active.len(),
            self.frontier_z
        );
    }

    /// Recycle every active segment and place a fresh initial run from z = 0
    pub fn reset_track(&mut self, difficulty: &Difficulty) {
        self.prewarm();
        while let Some(handle) = self.active.pop_front() {
            self.recycle(handle);
        }
        self.frontier_z = 0.0;
        self.rng = Pcg32::seed_from_u64(self.config.seed);

        if self.is_inert() {
            return;
        }
        for _ in 0..self.config.initial_segments {
            if !self.spawn_next(difficulty) {
                break;
            }
        }
        log::debug!("Track reset: {} segments placed", self.active.len());
    }

    /// Rebind the position source read by [`TrackManager::update`]
    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
    }

    /// Per-frame update using the bound observer (no-op without one)
    pub fn update(&mut self, difficulty: &Difficulty) {
        let Some(position) = self.observer.as_ref().map(Observer::get) else {
            return;
        };
        self.tick(position, difficulty);
    }

    /// Extend the track ahead of `observer` and recycle what fell behind
    pub fn tick(&mut self, observer: Vec3, difficulty: &Difficulty) {
        if self.is_inert() {
            return;
        }
        let observer_z = observer.z;
        let reach = self.config.look_ahead as f32 * self.config.nominal_segment_length;

        while self.active.len() < self.config.look_ahead || self.frontier_z < observer_z + reach {
            if !self.spawn_next(difficulty) {
                break;
            }
        }

        self.recycle_behind(observer_z);
    }

    /// Apply a touched entity's effect (at most once per activation)
    pub fn touch(
        &mut self,
        entity: EntityHandle,
        ledger: &mut dyn Ledger,
        audio: &mut dyn AudioSink,
    ) -> bool {
        self.entities
            .get_mut(entity)
            .is_some_and(|e| e.touch(ledger, audio))
    }

    /// Active entities within `radius` of `position`
    pub fn entities_near(
        &self,
        position: Vec3,
        radius: f32,
    ) -> impl Iterator<Item = EntityHandle> + '_ {
        self.active
            .iter()
            .filter_map(move |&h| self.segments.get(h))
            .flat_map(|s| s.attached().iter().copied())
            .filter(move |&h| {
                self.entities
                    .get(h)
                    .is_some_and(|e| e.is_active() && e.position.distance(position) <= radius)
            })
    }

    /// True when no segment template is available
    pub fn is_inert(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn frontier_z(&self) -> f32 {
        self.frontier_z
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn active_handles(&self) -> impl Iterator<Item = SegmentHandle> + '_ {
        self.active.iter().copied()
    }

    /// Placed segments, oldest first
    pub fn active_segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.active.iter().filter_map(move |&h| self.segments.get(h))
    }

    pub fn segment(&self, handle: SegmentHandle) -> Option<&Segment> {
        self.segments.get(handle)
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle)
    }

    pub fn segment_pool(&self) -> &SegmentPool {
        &self.segments
    }

    pub fn entity_pool(&self) -> &EntityPool {
        &self.entities
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn populator(&self) -> &Populator {
        &self.populator
    }

    fn prewarm(&mut self) {
        if self.warmed {
            return;
        }
        self.warmed = true;

        if !self.templates.is_empty() {
            let wanted = self.config.initial_segments + self.config.segment_pool_slack;
            let per_template = wanted.div_ceil(self.templates.len());
            for (i, template) in self.templates.iter().enumerate() {
                let id = SegmentTemplateId(i as u16);
                self.segments
                    .prewarm(id, per_template, |id| Segment::new(id, template));
            }
        }

        self.populator.prewarm(
            &mut self.entities,
            self.config.obstacle_warm_count,
            self.config.pickup_warm_count,
        );
        log::debug!(
            "Pools warmed: {} segments, {} entities",
            self.segments.len(),
            self.entities.len()
        );
    }

    fn pick_template(&mut self) -> Option<SegmentTemplateId> {
        match self.templates.len() {
            0 => None,
            1 => Some(SegmentTemplateId(0)),
            _ => {
                let r = self.rng.next_unit();
                let chosen = select_weighted(&self.templates, |t| t.weight, r)?;
                let index = self
                    .templates
                    .iter()
                    .position(|t| std::ptr::eq(t, chosen))?;
                Some(SegmentTemplateId(index as u16))
            }
        }
    }

    /// Place, populate and append one segment at the frontier
    fn spawn_next(&mut self, difficulty: &Difficulty) -> bool {
        let Some(id) = self.pick_template() else {
            log::warn!("No segment template available to spawn");
            return false;
        };
        let obstacle_density = difficulty.obstacle_density();
        let pickup_density = difficulty.pickup_density();

        let template = &self.templates[id.0 as usize];
        let handle = self.segments.acquire_with(id, |id| Segment::new(id, template));
        let Some(segment) = self.segments.get_mut(handle) else {
            return false;
        };

        segment.place(self.frontier_z);
        let placed = self.populator.populate(
            segment,
            &mut self.entities,
            &mut self.rng,
            obstacle_density,
            pickup_density,
        );
        self.frontier_z += segment.length();
        // Fully populated before it becomes visible to recycling
        self.active.push_back(handle);

        log::debug!(
            "Spawned segment {:?} at z={} with {placed} entities",
            handle,
            self.frontier_z - segment.length()
        );
        true
    }

    fn recycle_behind(&mut self, observer_z: f32) {
        let limit = observer_z - self.config.trailing_margin;
        while let Some(&front) = self.active.front() {
            let behind = self
                .segments
                .get(front)
                .is_some_and(|s| s.start_z() < limit && s.end_z() <= observer_z);
            if !behind {
                break;
            }
            self.active.pop_front();
            self.recycle(front);
        }
    }

    fn recycle(&mut self, handle: SegmentHandle) {
        if let Some(segment) = self.segments.get_mut(handle) {
            segment.clear_into(&mut self.entities);
            log::debug!("Recycled segment {:?} from z={}", handle, segment.start_z());
        }
        self.segments.release(handle);
    }
}
