//! Track segments: fixed-length slices of track with lane anchors

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{EntityHandle, EntityPool};
use super::pool::{Handle, Pool, Poolable};
use crate::consts::*;
use crate::lane_offsets;

/// Shape of a segment as loaded from config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentTemplate {
    pub name: String,
    /// Forward extent (world units)
    pub length: f32,
    /// Lateral offset of each lane anchor
    pub lane_offsets: Vec<f32>,
    /// Forward offset of the anchors from the segment start
    pub anchor_z: f32,
    /// Relative chance of this template being picked
    pub weight: f32,
}

impl Default for SegmentTemplate {
    fn default() -> Self {
        Self {
            name: "straight".to_owned(),
            length: NOMINAL_SEGMENT_LENGTH,
            lane_offsets: lane_offsets(LANE_COUNT, LANE_WIDTH),
            anchor_z: NOMINAL_SEGMENT_LENGTH / 2.0,
            weight: 1.0,
        }
    }
}

/// Index into the configured segment template list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentTemplateId(pub u16);

/// A pooled slice of track
#[derive(Debug, Clone)]
pub struct Segment {
    pub template: SegmentTemplateId,
    length: f32,
    /// Anchor positions relative to the segment start
    anchors: Vec<Vec3>,
    start_z: f32,
    active: bool,
    attached: Vec<EntityHandle>,
}

impl Segment {
    pub fn new(id: SegmentTemplateId, template: &SegmentTemplate) -> Self {
        let anchors: Vec<Vec3> = template
            .lane_offsets
            .iter()
            .map(|&x| Vec3::new(x, 0.0, template.anchor_z))
            .collect();
        Self {
            template: id,
            length: template.length,
            attached: Vec::with_capacity(anchors.len()),
            anchors,
            start_z: 0.0,
            active: false,
        }
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn start_z(&self) -> f32 {
        self.start_z
    }

    pub fn end_z(&self) -> f32 {
        self.start_z + self.length
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Move the segment so it starts at `start_z`
    pub fn place(&mut self, start_z: f32) {
        self.start_z = start_z;
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// World position of a lane anchor
    pub fn anchor(&self, lane: usize) -> Option<Vec3> {
        match self.anchors.get(lane) {
            Some(local) => Some(*local + Vec3::new(0.0, 0.0, self.start_z)),
            None => {
                log::warn!(
                    "Invalid lane index: {lane}. Segment has {} anchors",
                    self.anchors.len()
                );
                None
            }
        }
    }

    /// Track an entity placed on this segment
    pub fn attach(&mut self, entity: EntityHandle) {
        if !self.attached.contains(&entity) {
            self.attached.push(entity);
        }
    }

    pub fn attached(&self) -> &[EntityHandle] {
        &self.attached
    }

    /// Send every attached entity back to its pool
    pub fn clear_into(&mut self, entities: &mut EntityPool) {
        for handle in self.attached.drain(..) {
            entities.release(handle);
        }
    }
}

impl Poolable for Segment {
    type Key = SegmentTemplateId;

    fn pool_key(&self) -> SegmentTemplateId {
        self.template
    }

    fn on_acquire(&mut self) {
        self.active = true;
    }

    fn on_release(&mut self) {
        self.active = false;
        debug_assert!(self.attached.is_empty(), "segment released with attached entities");
    }
}

pub type SegmentPool = Pool<Segment>;
pub type SegmentHandle = Handle<Segment>;
