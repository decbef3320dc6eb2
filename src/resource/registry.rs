use std::marker::PhantomData;

use super::handle::Handle;
use crate::error::{RenderError, RenderResult};

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-stamped arena keyed by [`Handle<Tag>`].
///
/// `Tag` is the resource category the issued handles carry; it defaults to
/// the stored type, but an owner may expose a public tag (say,
/// `Handle<Viewport>`) while keeping its per-entry state private.
///
/// No two live entries of the same kind ever share a handle value; a
/// released slot is only reissued with a bumped generation, so stale
/// handles fail every lookup instead of aliasing the new occupant.
pub struct Registry<T, Tag = T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    _tag: PhantomData<Tag>,
}

impl<T, Tag> Default for Registry<T, Tag> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            _tag: PhantomData,
        }
    }
}

impl<T, Tag> Registry<T, Tag> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle<Tag> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle::new(index, 0)
    }

    /// Release the resource behind `handle`.
    ///
    /// Policy: releasing [`Handle::EMPTY`] is an idempotent no-op
    /// (`Ok(None)`); releasing a stale or never-issued handle is an
    /// [`RenderError::InvalidHandle`] error.
    pub fn remove(&mut self, handle: Handle<Tag>) -> RenderResult<Option<T>> {
        if handle.is_empty() {
            return Ok(None);
        }
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation() && slot.value.is_some())
            .ok_or_else(RenderError::invalid_handle::<Tag>)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        self.free.push(handle.index() as u32);
        Ok(slot.value.take())
    }

    /// True while the handle denotes a live resource. Always false for
    /// [`Handle::EMPTY`] and for anything released.
    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle<Tag>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Lookup that reports instead of skipping, for paths where an invalid
    /// handle is a caller error rather than degradable content.
    pub fn try_get(&self, handle: Handle<Tag>) -> RenderResult<&T> {
        self.get(handle)
            .ok_or_else(RenderError::invalid_handle::<Tag>)
    }

    pub fn try_get_mut(&mut self, handle: Handle<Tag>) -> RenderResult<&mut T> {
        self.get_mut(handle)
            .ok_or_else(RenderError::invalid_handle::<Tag>)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entries in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Tag>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::new(index as u32, slot.generation), value))
        })
    }

    /// Drain every live entry, invalidating all outstanding handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.live);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                values.push(value);
            }
        }
        self.live = 0;
        values
    }
}

/// Handle-only allocator for identities the caller owns the data for
/// (model ids). Same reuse discipline as [`Registry`], no storage.
pub struct HandleAllocator<Tag> {
    registry: Registry<(), Tag>,
}

impl<Tag> Default for HandleAllocator<Tag> {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
        }
    }
}

impl<Tag> HandleAllocator<Tag> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Handle<Tag> {
        self.registry.insert(())
    }

    pub fn release(&mut self, handle: Handle<Tag>) -> RenderResult<()> {
        self.registry.remove(handle).map(|_| ())
    }

    pub fn is_live(&self, handle: Handle<Tag>) -> bool {
        self.registry.contains(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_after_insert_invalid_forever_after_remove() {
        let mut registry: Registry<u32> = Registry::new();
        let h = registry.insert(7u32);
        assert!(registry.contains(h));
        assert_eq!(registry.remove(h).unwrap(), Some(7));
        assert!(!registry.contains(h));
        // Reoccupy the slot; the old handle must stay dead.
        let h2 = registry.insert(8u32);
        assert!(!registry.contains(h));
        assert!(registry.contains(h2));
        assert_ne!(h, h2);
    }

    #[test]
    fn remove_empty_is_a_noop() {
        let mut registry: Registry<u32> = Registry::new();
        assert_eq!(registry.remove(Handle::EMPTY).unwrap(), None);
    }

    #[test]
    fn double_remove_is_an_error() {
        let mut registry: Registry<u32> = Registry::new();
        let h = registry.insert(1u32);
        registry.remove(h).unwrap();
        assert!(registry.remove(h).is_err());
    }

    #[test]
    fn never_issued_handle_is_invalid() {
        let registry: Registry<u32> = Registry::new();
        assert!(!registry.contains(Handle::new(3, 0)));
        assert!(registry.try_get(Handle::new(3, 0)).is_err());
    }

    #[test]
    fn live_handles_never_alias() {
        let mut registry: Registry<u32> = Registry::new();
        let mut handles = Vec::new();
        for i in 0..16u32 {
            handles.push(registry.insert(i));
        }
        for h in &handles[4..8] {
            registry.remove(*h).unwrap();
        }
        for i in 0..8u32 {
            handles.push(registry.insert(100 + i));
        }
        let live: Vec<_> = handles
            .iter()
            .filter(|h| registry.contains(**h))
            .collect();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn iter_walks_handle_order() {
        let mut registry: Registry<&str> = Registry::new();
        let a = registry.insert("a");
        let _b = registry.insert("b");
        registry.remove(a).unwrap();
        let values: Vec<_> = registry.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!["b"]);
    }

    #[test]
    fn drain_invalidates_everything() {
        let mut registry: Registry<u32> = Registry::new();
        let a = registry.insert(1u32);
        let b = registry.insert(2u32);
        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(!registry.contains(a));
        assert!(!registry.contains(b));
        assert!(registry.is_empty());
    }

    #[test]
    fn allocator_reuses_slots_with_fresh_generations() {
        struct Tag;
        let mut ids: HandleAllocator<Tag> = HandleAllocator::new();
        let a = ids.allocate();
        ids.release(a).unwrap();
        let b = ids.allocate();
        assert!(!ids.is_live(a));
        assert!(ids.is_live(b));
        assert_ne!(a, b);
    }
}
