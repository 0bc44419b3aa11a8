//! Placeable entities (obstacles and pickups) and their templates
//!
//! What an entity does on contact is fixed when its template is registered,
//! so a collision never has to ask "what kind of thing is this?".

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pool::{Handle, Pool, Poolable};
use crate::audio::{AudioCue, AudioSink};

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Coin,
    Trash,
}

/// What an entity is, and therefore what touching it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeable {
    Obstacle,
    Pickup(PickupKind),
}

/// Score/lives side of an entity effect
pub trait Ledger {
    fn lose_life(&mut self);
    fn add_coin(&mut self);
    fn add_trash(&mut self);
}

impl Placeable {
    pub fn apply(self, ledger: &mut dyn Ledger, audio: &mut dyn AudioSink) {
        match self {
            Placeable::Obstacle => {
                ledger.lose_life();
                audio.play(AudioCue::HitObstacle);
            }
            Placeable::Pickup(PickupKind::Coin) => {
                ledger.add_coin();
                audio.play(AudioCue::PickupCoin);
            }
            Placeable::Pickup(PickupKind::Trash) => {
                ledger.add_trash();
                audio.play(AudioCue::PickupTrash);
            }
        }
    }
}

/// Pool key for an entity template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u16);

/// Name -> id table for entity templates
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    names: Vec<String>,
    kinds: Vec<Placeable>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, or return the existing id for `name`
    pub fn register(&mut self, name: &str, kind: Placeable) -> Option<TemplateId> {
        if let Some(id) = self.id(name) {
            if self.kinds[id.0 as usize] != kind {
                log::warn!(
                    "Template '{name}' already registered as {:?}, ignoring {:?}",
                    self.kinds[id.0 as usize],
                    kind
                );
            }
            return Some(id);
        }
        let Ok(raw) = u16::try_from(self.names.len()) else {
            log::error!("Too many entity templates, '{name}' not registered");
            return None;
        };
        self.names.push(name.to_owned());
        self.kinds.push(kind);
        Some(TemplateId(raw))
    }

    pub fn id(&self, name: &str) -> Option<TemplateId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| TemplateId(i as u16))
    }

    pub fn kind(&self, id: TemplateId) -> Option<Placeable> {
        self.kinds.get(id.0 as usize).copied()
    }

    pub fn name(&self, id: TemplateId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Build a fresh, inactive instance of `id`
    pub fn instantiate(&self, id: TemplateId) -> Option<Entity> {
        self.kind(id).map(|kind| Entity::new(id, kind))
    }
}

/// A pooled obstacle or pickup
#[derive(Debug, Clone)]
pub struct Entity {
    pub template: TemplateId,
    pub kind: Placeable,
    pub position: Vec3,
    active: bool,
    /// Set on first contact, cleared on every (re)activation
    effect_applied: bool,
}

impl Entity {
    pub fn new(template: TemplateId, kind: Placeable) -> Self {
        Self {
            template,
            kind,
            position: Vec3::ZERO,
            active: false,
            effect_applied: false,
        }
    }

    /// In the world and collidable
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn effect_applied(&self) -> bool {
        self.effect_applied
    }

    /// Apply this entity's effect once, then deactivate.
    ///
    /// The entity stays attached to its segment until the segment is
    /// recycled. Returns false if nothing happened.
    pub fn touch(&mut self, ledger: &mut dyn Ledger, audio: &mut dyn AudioSink) -> bool {
        if !self.active || self.effect_applied {
            return false;
        }
        self.effect_applied = true;
        self.kind.apply(ledger, audio);
        self.active = false;
        true
    }
}

impl Poolable for Entity {
    type Key = TemplateId;

    fn pool_key(&self) -> TemplateId {
        self.template
    }

    fn on_acquire(&mut self) {
        self.active = true;
        self.effect_applied = false;
    }

    fn on_release(&mut self) {
        self.active = false;
        self.effect_applied = false;
    }
}

pub type EntityPool = Pool<Entity>;
pub type EntityHandle = Handle<Entity>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;

    #[derive(Default)]
    struct Tally {
        lives_lost: u32,
        coins: u32,
        trash: u32,
    }

    impl Ledger for Tally {
        fn lose_life(&mut self) {
            self.lives_lost += 1;
        }
        fn add_coin(&mut self) {
            self.coins += 1;
        }
        fn add_trash(&mut self) {
            self.trash += 1;
        }
    }

    #[test]
    fn test_registry_dedupes_names() {
        let mut registry = TemplateRegistry::new();
        let barrier = registry.register("barrier", Placeable::Obstacle).unwrap();
        let coin = registry.register("coin", Placeable::Pickup(PickupKind::Coin)).unwrap();
        assert_ne!(barrier, coin);
        assert_eq!(registry.register("barrier", Placeable::Obstacle), Some(barrier));
        // Conflicting kind keeps the first registration
        assert_eq!(
            registry.register("coin", Placeable::Obstacle),
            Some(coin)
        );
        assert_eq!(registry.kind(coin), Some(Placeable::Pickup(PickupKind::Coin)));
        assert_eq!(registry.name(barrier), Some("barrier"));
        assert_eq!(registry.len(), 2);
        assert!(registry.instantiate(TemplateId(9)).is_none());
    }

    #[test]
    fn test_touch_applies_once_per_activation() {
        let mut pool = EntityPool::new();
        let id = TemplateId(0);
        let make = |id| Entity::new(id, Placeable::Obstacle);
        let handle = pool.acquire_with(id, make);

        let mut tally = Tally::default();
        let mut audio = RecordingAudio::default();
        let entity = pool.get_mut(handle).unwrap();
        assert!(entity.touch(&mut tally, &mut audio));
        assert!(!entity.touch(&mut tally, &mut audio));
        assert!(!entity.is_active());
        assert_eq!(tally.lives_lost, 1);
        assert_eq!(audio.cues, vec![AudioCue::HitObstacle]);

        // Recycled instance can fire again
        pool.release(handle);
        let again = pool.acquire_with(id, make);
        assert_eq!(again, handle);
        assert!(!pool.get(again).unwrap().effect_applied());
        assert!(pool.get_mut(again).unwrap().touch(&mut tally, &mut audio));
        assert_eq!(tally.lives_lost, 2);
    }

    #[test]
    fn test_pickup_effects() {
        let mut tally = Tally::default();
        let mut audio = RecordingAudio::default();
        Placeable::Pickup(PickupKind::Coin).apply(&mut tally, &mut audio);
        Placeable::Pickup(PickupKind::Trash).apply(&mut tally, &mut audio);
        assert_eq!((tally.coins, tally.trash, tally.lives_lost), (1, 1, 0));
        assert_eq!(audio.cues, vec![AudioCue::PickupCoin, AudioCue::PickupTrash]);
    }

    #[test]
    fn test_idle_entity_cannot_be_touched() {
        let mut entity = Entity::new(TemplateId(0), Placeable::Pickup(PickupKind::Coin));
        let mut tally = Tally::default();
        assert!(!entity.touch(&mut tally, &mut crate::audio::NullAudio));
        assert_eq!(tally.coins, 0);
    }
}
