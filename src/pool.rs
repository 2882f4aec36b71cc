//! Node arena.

use std::{
    fmt, iter,
    ops::{Index, IndexMut},
    slice,
};

use crate::NodeId;

#[derive(Clone, Debug)]
pub(crate) enum Slot<T> {
    Occupied(T),
    Free,
}

impl<T> Slot<T> {
    #[inline(always)]
    fn item(&self) -> Option<&T> {
        match self {
            Slot::Occupied(item) => Some(item),
            Slot::Free => None,
        }
    }

    #[inline(always)]
    fn item_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(item) => Some(item),
            Slot::Free => None,
        }
    }
}

/// Flat arena addressed by [`NodeId`].
///
/// Removing an item frees its slot; the slot is handed out again by the next
/// [`insert`](Pool::insert), so ids of live items never move.
#[derive(Clone)]
pub struct Pool<T> {
    pub(crate) slots: Vec<Slot<T>>,
    pub(crate) free: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Pool::with_capacity(0)
    }
}

impl<T: fmt::Debug> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// ```ignore
/// let node = &tree.nodes[tree.root()];
/// ```
impl<T> Index<NodeId> for Pool<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.slots[usize::from(id)]
            .item()
            .unwrap_or_else(|| unreachable!("{id} is freed"))
    }
}

impl<T> IndexMut<NodeId> for Pool<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[usize::from(id)]
            .item_mut()
            .unwrap_or_else(|| unreachable!("{id} is freed"))
    }
}

impl<T> Pool<T> {
    /// Helps to reduce the amount of the memory reallocations.
    pub fn with_capacity(capacity: usize) -> Self {
        Pool {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Most recently freed slot first.
    pub(crate) fn insert(&mut self, item: T) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Slot::Occupied(item);
                idx.into()
            }
            None => {
                self.slots.push(Slot::Occupied(item));
                (self.slots.len() - 1).into()
            }
        }
    }

    /// Frees the slot and returns its item. Freeing twice is a no-op.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        let idx = usize::from(id);
        let slot = self.slots.get_mut(idx)?;
        if let Slot::Occupied(item) = std::mem::replace(slot, Slot::Free) {
            self.free.push(idx);
            Some(item)
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(usize::from(id)).and_then(Slot::item)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(usize::from(id)).and_then(Slot::item_mut)
    }

    #[inline(always)]
    pub fn is_free(&self, id: NodeId) -> bool {
        self.get(id).is_none()
    }

    /// Number of live items.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freed slots waiting for reuse.
    #[inline(always)]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Live items with their ids, in slot order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.slots.iter().enumerate(),
            remaining: self.len(),
        }
    }
}

/// Iterator over the live items of a [`Pool`].
#[derive(Clone)]
pub struct Iter<'pool, T> {
    inner: iter::Enumerate<slice::Iter<'pool, Slot<T>>>,
    remaining: usize,
}

impl<'pool, T> Iterator for Iter<'pool, T> {
    type Item = (NodeId, &'pool T);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, item) = self
            .inner
            .by_ref()
            .find_map(|(idx, slot)| slot.item().map(|item| (idx, item)))?;
        self.remaining -= 1;
        Some((idx.into(), item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> iter::FusedIterator for Iter<'_, T> {}
