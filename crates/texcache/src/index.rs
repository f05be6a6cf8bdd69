//! Fixed-bucket hash index over live cache entries.
//!
//! Each bucket heads a chain threaded through the arena's `next` links.
//! Several distinct descriptors routinely share an address across frames, so
//! chains are compared by full descriptor value on lookup and by handle on
//! removal.

use crate::arena::{Arena, EntryId, Residency};
#[cfg(test)]
use crate::arena::Chain;
use crate::types::TextureDescriptor;

pub(crate) struct CacheIndex {
    buckets: Vec<Option<EntryId>>,
}

impl CacheIndex {
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: vec![None; buckets],
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Texture origins are 4-byte aligned, so the low two address bits carry no entropy.
    pub fn hash(&self, address: u32) -> usize {
        (address >> 2) as usize % self.buckets.len()
    }

    pub fn head(&self, bucket: usize) -> Option<EntryId> {
        self.buckets.get(bucket).copied().flatten()
    }

    pub fn lookup<T>(&self, arena: &Arena<T>, descriptor: &TextureDescriptor) -> Option<EntryId> {
        if !self.is_initialized() {
            return None;
        }
        let bucket = self.hash(descriptor.address);
        arena
            .chain(self.buckets[bucket])
            .find(|&id| arena.get(id).is_some_and(|entry| entry.descriptor == *descriptor))
    }

    /// Pushes at the head of the entry's bucket; freshly created entries are the likeliest to be fetched next.
    pub fn insert<T>(&mut self, arena: &mut Arena<T>, id: EntryId) {
        if !self.is_initialized() {
            return;
        }
        let Some(entry) = arena.get(id) else {
            return;
        };
        let bucket = self.hash(entry.descriptor.address);
        arena.set_next(id, self.buckets[bucket]);
        arena.set_residency(id, Residency::Indexed);
        self.buckets[bucket] = Some(id);
    }

    /// Detaches `id` from its bucket chain. Returns `false` if it was not indexed.
    pub fn unlink<T>(&mut self, arena: &mut Arena<T>, id: EntryId) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let Some(entry) = arena.get(id) else {
            return false;
        };
        let bucket = self.hash(entry.descriptor.address);
        let mut prev: Option<EntryId> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(current) = cursor {
            let next = arena.next(current);
            if current == id {
                match prev {
                    Some(prev) => arena.set_next(prev, next),
                    None => self.buckets[bucket] = next,
                }
                arena.set_next(id, None);
                return true;
            }
            prev = Some(current);
            cursor = next;
        }
        false
    }

    pub fn pop_front<T>(&mut self, arena: &mut Arena<T>, bucket: usize) -> Option<EntryId> {
        let id = self.head(bucket)?;
        self.buckets[bucket] = arena.next(id);
        arena.set_next(id, None);
        Some(id)
    }

    #[cfg(test)]
    pub fn bucket_chain<'a, T>(&self, arena: &'a Arena<T>, bucket: usize) -> Chain<'a, T> {
        arena.chain(self.head(bucket))
    }

    /// Every indexed entry in bucket order, chains head first.
    pub fn ids<T>(&self, arena: &Arena<T>) -> Vec<EntryId> {
        self.buckets
            .iter()
            .flat_map(|&head| arena.chain(head))
            .collect()
    }

    pub fn teardown(&mut self) {
        self.buckets = Vec::new();
    }
}
