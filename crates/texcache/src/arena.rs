//! Slot storage for cache entries.
//!
//! Entries never move once inserted; the index chains and the recycle pool
//! thread through them with a single `next` link per slot, and every live
//! slot carries a tag saying which of the two structures currently owns it.
//! Removing an entry bumps the slot generation so stale [`EntryId`]s stop
//! resolving.


use crate::entry::CacheEntry;

/// Stable handle to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

/// Which structure currently owns an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Indexed,
    Pooled,
}

struct Node<T> {
    entry: CacheEntry<T>,
    next: Option<EntryId>,
    residency: Residency,
}

struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn insert(&mut self, entry: CacheEntry<T>, residency: Residency) -> EntryId {
        let node = Node {
            entry,
            next: None,
            residency,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            EntryId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            EntryId {
                index,
                generation: 0,
            }
        }
    }

    /// Destroys the entry, releasing its resources.
    pub fn remove(&mut self, id: EntryId) -> Option<CacheEntry<T>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node.entry)
    }

    fn node(&self, id: EntryId) -> Option<&Node<T>> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: EntryId) -> Option<&mut Node<T>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn get(&self, id: EntryId) -> Option<&CacheEntry<T>> {
        self.node(id).map(|node| &node.entry)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut CacheEntry<T>> {
        self.node_mut(id).map(|node| &mut node.entry)
    }

    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        self.node(id).and_then(|node| node.next)
    }

    pub fn set_next(&mut self, id: EntryId, next: Option<EntryId>) {
        if let Some(node) = self.node_mut(id) {
            node.next = next;
        }
    }

    pub fn residency(&self, id: EntryId) -> Option<Residency> {
        self.node(id).map(|node| node.residency)
    }

    pub fn set_residency(&mut self, id: EntryId, residency: Residency) {
        if let Some(node) = self.node_mut(id) {
            node.residency = residency;
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Follows `next` links starting at `head`.
    pub fn chain(&self, head: Option<EntryId>) -> Chain<'_, T> {
        Chain {
            arena: self,
            cursor: head,
        }
    }
}

pub(crate) struct Chain<'a, T> {
    arena: &'a Arena<T>,
    cursor: Option<EntryId>,
}

impl<T> Iterator for Chain<'_, T> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let id = self.cursor?;
        self.cursor = self.arena.next(id);
        Some(id)
    }
}
