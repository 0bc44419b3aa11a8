//! Segment population: what spawns at each lane anchor
//!
//! Per anchor: one roll against obstacle density; only when that misses,
//! a second roll against pickup density. At most one entity per anchor.
//! `min_spacing` is carried on every entry but is not consulted here.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityPool, PickupKind, Placeable, TemplateId, TemplateRegistry};
use super::segment::Segment;
use crate::consts::*;

/// Uniform samples in [0, 1)
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;
}

impl RandomSource for Pcg32 {
    fn next_unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

fn default_obstacle_spacing() -> f32 {
    OBSTACLE_MIN_SPACING
}

fn default_pickup_spacing() -> f32 {
    PICKUP_MIN_SPACING
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleEntry {
    pub template: String,
    /// Relative spawn weight (0-1)
    #[serde(alias = "probability")]
    pub weight: f32,
    #[serde(default = "default_obstacle_spacing")]
    pub min_spacing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupEntry {
    pub template: String,
    pub kind: PickupKind,
    #[serde(alias = "probability")]
    pub weight: f32,
    #[serde(default = "default_pickup_spacing")]
    pub min_spacing: f32,
}

/// Obstacle and pickup tables, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub obstacles: Vec<ObstacleEntry>,
    pub pickups: Vec<PickupEntry>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            obstacles: vec![
                ObstacleEntry {
                    template: "barrier".to_owned(),
                    weight: 0.7,
                    min_spacing: OBSTACLE_MIN_SPACING,
                },
                ObstacleEntry {
                    template: "hurdle".to_owned(),
                    weight: 0.3,
                    min_spacing: OBSTACLE_MIN_SPACING,
                },
            ],
            pickups: vec![
                PickupEntry {
                    template: "coin".to_owned(),
                    kind: PickupKind::Coin,
                    weight: 0.8,
                    min_spacing: PICKUP_MIN_SPACING,
                },
                PickupEntry {
                    template: "trash_bag".to_owned(),
                    kind: PickupKind::Trash,
                    weight: 0.2,
                    min_spacing: PICKUP_MIN_SPACING,
                },
            ],
        }
    }
}

impl SpawnConfig {
    /// No entries at all; segments stay empty
    pub fn empty() -> Self {
        Self {
            obstacles: Vec::new(),
            pickups: Vec::new(),
        }
    }
}

/// A resolved spawn table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnEntry {
    pub template: TemplateId,
    pub kind: Placeable,
    pub weight: f32,
    /// Declared minimum distance between spawns of this template (not enforced)
    pub min_spacing: f32,
}

/// Weighted pick: `r` in [0, 1) is scaled by the total weight and the first
/// item whose cumulative weight reaches it wins.
pub fn select_weighted<T>(items: &[T], weight: impl Fn(&T) -> f32, r: f32) -> Option<&T> {
    let first = items.first()?;
    let total: f32 = items.iter().map(&weight).sum();
    let target = r * total;
    let mut cumulative = 0.0;
    for item in items {
        cumulative += weight(item);
        if target <= cumulative {
            return Some(item);
        }
    }
    // Float rounding can leave target just past the last boundary
    Some(first)
}

#[derive(Debug, Clone, Default)]
pub struct Populator {
    obstacles: Vec<SpawnEntry>,
    pickups: Vec<SpawnEntry>,
}

impl Populator {
    /// Resolve config entries into templates, registering their names
    pub fn new(config: &SpawnConfig, registry: &mut TemplateRegistry) -> Self {
        let mut obstacles = Vec::with_capacity(config.obstacles.len());
        for entry in &config.obstacles {
            if let Some(template) = registry.register(&entry.template, Placeable::Obstacle) {
                obstacles.push(SpawnEntry {
                    template,
                    kind: Placeable::Obstacle,
                    weight: entry.weight,
                    min_spacing: entry.min_spacing,
                });
            }
        }

        let mut pickups = Vec::with_capacity(config.pickups.len());
        for entry in &config.pickups {
            let kind = Placeable::Pickup(entry.kind);
            if let Some(template) = registry.register(&entry.template, kind) {
                pickups.push(SpawnEntry {
                    template,
                    kind: registry.kind(template).unwrap_or(kind),
                    weight: entry.weight,
                    min_spacing: entry.min_spacing,
                });
            }
        }

        if obstacles.is_empty() && pickups.is_empty() {
            log::warn!("Spawn config has no entries, segments will be empty");
        }

        Self { obstacles, pickups }
    }

    pub fn obstacles(&self) -> &[SpawnEntry] {
        &self.obstacles
    }

    pub fn pickups(&self) -> &[SpawnEntry] {
        &self.pickups
    }

    /// Fill entity pools ahead of the first run
    pub fn prewarm(&self, entities: &mut EntityPool, obstacle_count: usize, pickup_count: usize) {
        let tables = [(&self.obstacles, obstacle_count), (&self.pickups, pickup_count)];
        for (entries, count) in tables {
            for entry in entries.iter() {
                // One warm batch per template even if listed twice
                if entities.instance_count(entry.template) == 0 {
                    let kind = entry.kind;
                    entities.prewarm(entry.template, count, |id| Entity::new(id, kind));
                }
            }
        }
    }

    /// Place entities on `segment`'s anchors. Returns how many were placed.
    pub fn populate(
        &self,
        segment: &mut Segment,
        entities: &mut EntityPool,
        rng: &mut dyn RandomSource,
        obstacle_density: f32,
        pickup_density: f32,
    ) -> usize {
        let mut placed = 0;
        for lane in 0..segment.anchor_count() {
            let Some(anchor) = segment.anchor(lane) else {
                continue;
            };

            let chosen = if rng.next_unit() < obstacle_density {
                Self::pick(&self.obstacles, rng)
            } else if rng.next_unit() < pickup_density {
                Self::pick(&self.pickups, rng)
            } else {
                None
            };

            let Some(entry) = chosen else {
                continue;
            };
            let kind = entry.kind;
            let handle = entities.acquire_with(entry.template, |id| Entity::new(id, kind));
            if let Some(entity) = entities.get_mut(handle) {
                entity.position = anchor;
            }
            segment.attach(handle);
            placed += 1;
        }
        placed
    }

    fn pick<'a>(entries: &'a [SpawnEntry], rng: &mut dyn RandomSource) -> Option<&'a SpawnEntry> {
        if entries.is_empty() {
            return None;
        }
        select_weighted(entries, |e| e.weight, rng.next_unit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::segment::{SegmentTemplate, SegmentTemplateId};
    use rand::SeedableRng;

    /// Replays a fixed list of samples, cycling
    struct Fixed {
        values: Vec<f32>,
        next: usize,
    }

    impl Fixed {
        fn new(values: &[f32]) -> Self {
            Self {
                values: values.to_vec(),
                next: 0,
            }
        }
    }

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f32 {
            let v = self.values[self.next % self.values.len()];
            self.next += 1;
            v
        }
    }

    fn two_obstacles() -> (Populator, TemplateRegistry) {
        let config = SpawnConfig {
            obstacles: vec![
                ObstacleEntry {
                    template: "a".into(),
                    weight: 0.7,
                    min_spacing: 5.0,
                },
                ObstacleEntry {
                    template: "b".into(),
                    weight: 0.3,
                    min_spacing: 5.0,
                },
            ],
            pickups: vec![PickupEntry {
                template: "coin".into(),
                kind: PickupKind::Coin,
                weight: 1.0,
                min_spacing: 3.0,
            }],
        };
        let mut registry = TemplateRegistry::new();
        let populator = Populator::new(&config, &mut registry);
        (populator, registry)
    }

    fn segment() -> Segment {
        Segment::new(SegmentTemplateId(0), &SegmentTemplate::default())
    }

    #[test]
    fn test_weighted_selection_boundaries() {
        let weights = [0.7f32, 0.3];
        assert_eq!(select_weighted(&weights, |w| *w, 0.65), Some(&0.7));
        assert_eq!(select_weighted(&weights, |w| *w, 0.75), Some(&0.3));
        assert_eq!(select_weighted(&weights, |w| *w, 0.0), Some(&0.7));
        assert_eq!(select_weighted::<f32>(&[], |w| *w, 0.5), None);
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        // Total 0.5: 0.65 * 0.5 = 0.325 > 0.2 -> second
        let weights = [0.2f32, 0.3];
        assert_eq!(select_weighted(&weights, |w| *w, 0.65), Some(&0.3));
        assert_eq!(select_weighted(&weights, |w| *w, 0.3), Some(&0.2));
    }

    #[test]
    fn test_fixed_stream_picks_by_weight() {
        let (populator, registry) = two_obstacles();
        let a = registry.id("a").unwrap();
        let b = registry.id("b").unwrap();

        let mut entities = EntityPool::new();
        let mut seg = segment();
        // Every roll 0.65: obstacle (0.65 < 1.0), then weighted pick -> "a"
        let placed = populator.populate(&mut seg, &mut entities, &mut Fixed::new(&[0.65]), 1.0, 0.0);
        assert_eq!(placed, 3);
        for &handle in seg.attached() {
            assert_eq!(entities.get(handle).unwrap().template, a);
        }

        let mut seg = segment();
        populator.populate(&mut seg, &mut entities, &mut Fixed::new(&[0.75]), 1.0, 0.0);
        for &handle in seg.attached() {
            assert_eq!(entities.get(handle).unwrap().template, b);
        }
    }

    #[test]
    fn test_pickup_only_rolled_when_obstacle_misses() {
        let (populator, registry) = two_obstacles();
        let coin = registry.id("coin").unwrap();
        let mut entities = EntityPool::new();
        let mut seg = segment();

        // obstacle roll 0.9 misses 0.5, pickup roll 0.1 hits 0.5, pick roll 0.0
        let mut rng = Fixed::new(&[0.9, 0.1, 0.0]);
        let placed = populator.populate(&mut seg, &mut entities, &mut rng, 0.5, 0.5);
        assert_eq!(placed, 3);
        for &handle in seg.attached() {
            let entity = entities.get(handle).unwrap();
            assert_eq!(entity.template, coin);
            assert_eq!(entity.kind, Placeable::Pickup(PickupKind::Coin));
            assert!(entity.is_active());
        }
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let (populator, _) = two_obstacles();
        let mut entities = EntityPool::new();
        let mut seg = segment();
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(populator.populate(&mut seg, &mut entities, &mut rng, 0.0, 0.0), 0);
        assert!(seg.attached().is_empty());
    }

    #[test]
    fn test_empty_table_places_nothing() {
        let mut registry = TemplateRegistry::new();
        let populator = Populator::new(&SpawnConfig::empty(), &mut registry);
        let mut entities = EntityPool::new();
        let mut seg = segment();
        let mut rng = Fixed::new(&[0.0]);
        assert_eq!(populator.populate(&mut seg, &mut entities, &mut rng, 1.0, 1.0), 0);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_entities_placed_at_anchors() {
        let (populator, _) = two_obstacles();
        let mut entities = EntityPool::new();
        let mut seg = segment();
        seg.place(20.0);
        populator.populate(&mut seg, &mut entities, &mut Fixed::new(&[0.1]), 1.0, 0.0);
        for (lane, &handle) in seg.attached().iter().enumerate() {
            assert_eq!(Some(entities.get(handle).unwrap().position), seg.anchor(lane));
        }
    }

    #[test]
    fn test_prewarm_counts() {
        let mut registry = TemplateRegistry::new();
        let populator = Populator::new(&SpawnConfig::default(), &mut registry);
        let mut entities = EntityPool::new();
        populator.prewarm(&mut entities, OBSTACLE_WARM_COUNT, PICKUP_WARM_COUNT);
        populator.prewarm(&mut entities, OBSTACLE_WARM_COUNT, PICKUP_WARM_COUNT);

        let barrier = registry.id("barrier").unwrap();
        let coin = registry.id("coin").unwrap();
        assert_eq!(entities.idle_count(barrier), OBSTACLE_WARM_COUNT);
        assert_eq!(entities.idle_count(coin), PICKUP_WARM_COUNT);
        assert_eq!(entities.len(), 2 * OBSTACLE_WARM_COUNT + 2 * PICKUP_WARM_COUNT);
    }

    #[test]
    fn test_min_spacing_carried() {
        let config: SpawnConfig = serde_json::from_str(
            r#"{"obstacles":[{"template":"wall","probability":0.5}],
                "pickups":[{"template":"coin","kind":"Coin","weight":1.0,"min_spacing":1.5}]}"#,
        )
        .unwrap();
        let mut registry = TemplateRegistry::new();
        let populator = Populator::new(&config, &mut registry);
        assert_eq!(populator.obstacles()[0].min_spacing, OBSTACLE_MIN_SPACING);
        assert_eq!(populator.obstacles()[0].weight, 0.5);
        assert_eq!(populator.pickups()[0].min_spacing, 1.5);
    }
}
