use std::fmt;
use std::marker::PhantomData;

/// Opaque, type-tagged identifier for a GPU-resident resource.
///
/// A handle is an index into the owning registry plus a generation stamp.
/// The stamp is bumped when the slot is released, so a handle held past
/// `remove` is detectably stale rather than silently aliasing a newer
/// resource.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<T>,
}

// Manual impls so the marker type does not have to satisfy the derives.
impl<T> Copy for Handle<T> {}
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for Handle<T> {}
impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}
impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Handle<{}>(empty)", std::any::type_name::<T>())
        } else {
            write!(
                f,
                "Handle<{}>({}v{})",
                std::any::type_name::<T>(),
                self.index,
                self.generation
            )
        }
    }
}

impl<T> Handle<T> {
    /// The reserved "no resource" value. Never valid in any registry.
    pub const EMPTY: Self = Handle {
        index: u32::MAX,
        generation: 0,
        _marker: PhantomData,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn is_empty(self) -> bool {
        self.index == u32::MAX
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}
