//! Keyed object pool with typed handles
//!
//! Instances are created once and never freed. Each instance is either
//! handed out (active) or waiting in the FIFO idle queue for its key, never
//! both. The pool grows on demand and never shrinks.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Something that can live in a [`Pool`]
pub trait Poolable {
    /// Template identity used to pick the idle queue
    type Key: Copy + Eq + Hash + fmt::Debug;

    fn pool_key(&self) -> Self::Key;

    /// Handed out to the world (fresh or recycled)
    fn on_acquire(&mut self);

    /// Returned to the idle queue
    fn on_release(&mut self);
}

/// Stable index of a pooled instance
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

struct Slot<T> {
    item: T,
    idle: bool,
}

pub struct Pool<T: Poolable> {
    slots: Vec<Slot<T>>,
    idle: HashMap<T::Key, VecDeque<Handle<T>>>,
    created: HashMap<T::Key, usize>,
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            idle: HashMap::new(),
            created: HashMap::new(),
        }
    }

    /// Create `count` idle instances of `key` up front
    pub fn prewarm(&mut self, key: T::Key, count: usize, mut make: impl FnMut(T::Key) -> T) {
        self.slots.reserve(count);
        let queue = self.idle.entry(key).or_default();
        queue.reserve(count);
        for _ in 0..count {
            let mut item = make(key);
            item.on_release();
            let handle = Handle::new(self.slots.len());
            self.slots.push(Slot { item, idle: true });
            queue.push_back(handle);
        }
        *self.created.entry(key).or_default() += count;
    }

    /// Take the oldest idle instance of `key`, or build a new one with `make`
    pub fn acquire_with(&mut self, key: T::Key, make: impl FnOnce(T::Key) -> T) -> Handle<T> {
        if let Some(handle) = self.idle.get_mut(&key).and_then(VecDeque::pop_front) {
            let slot = &mut self.slots[handle.index()];
            slot.idle = false;
            slot.item.on_acquire();
            return handle;
        }

        let mut item = make(key);
        item.on_acquire();
        let handle = Handle::new(self.slots.len());
        self.slots.push(Slot { item, idle: false });
        *self.created.entry(key).or_default() += 1;
        log::debug!("Pool grew for {:?} ({} instances)", key, self.created[&key]);
        handle
    }

    /// Deactivate an instance and queue it for reuse.
    ///
    /// Returns false (and changes nothing) if the handle is unknown or the
    /// instance is already idle.
    pub fn release(&mut self, handle: Handle<T>) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            log::warn!("Release of unknown pool handle {:?}", handle);
            return false;
        };
        if slot.idle {
            log::warn!("Double release of pool handle {:?} ignored", handle);
            return false;
        }
        slot.item.on_release();
        slot.idle = true;
        let key = slot.item.pool_key();
        self.idle.entry(key).or_default().push_back(handle);
        true
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots.get(handle.index()).map(|s| &s.item)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots.get_mut(handle.index()).map(|s| &mut s.item)
    }

    pub fn is_idle(&self, handle: Handle<T>) -> bool {
        self.slots.get(handle.index()).is_some_and(|s| s.idle)
    }

    /// Idle instances waiting under `key`
    pub fn idle_count(&self, key: T::Key) -> usize {
        self.idle.get(&key).map_or(0, VecDeque::len)
    }

    /// Every instance ever created for `key` (idle or active)
    pub fn instance_count(&self, key: T::Key) -> usize {
        self.created.get(&key).copied().unwrap_or(0)
    }

    /// Total instances across all keys
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Instances currently handed out
    pub fn active(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.idle)
            .map(|(i, s)| (Handle::new(i), &s.item))
    }
}
