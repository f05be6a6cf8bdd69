//! LIFO pool of evicted entries whose GPU resources are kept for reuse.

use crate::arena::{Arena, EntryId, Residency};
use crate::clock::FrameClock;
use crate::units::Liveness;

pub(crate) struct RecyclePool {
    head: Option<EntryId>,
    len: usize,
}

impl RecyclePool {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn ids<T>(&self, arena: &Arena<T>) -> Vec<EntryId> {
        arena.chain(self.head).collect()
    }

    /// Parks an unlinked entry. Entries without a resource have nothing worth
    /// keeping and are destroyed instead; returns `true` when that happens.
    pub fn recycle<T>(&mut self, arena: &mut Arena<T>, id: EntryId) -> bool {
        let Some(entry) = arena.get_mut(id) else {
            return false;
        };
        if entry.texture.is_none() {
            arena.remove(id);
            return true;
        }
        entry.clear_enhancement();
        arena.set_next(id, self.head);
        arena.set_residency(id, Residency::Pooled);
        self.head = Some(id);
        self.len += 1;
        false
    }

    /// Takes the most recently parked entry whose resource was allocated at exactly `width`×`height`.
    pub fn revive<T>(&mut self, arena: &mut Arena<T>, width: u32, height: u32) -> Option<EntryId> {
        let mut prev: Option<EntryId> = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let next = arena.next(current);
            if arena.get(current).is_some_and(|entry| entry.allocated == (width, height)) {
                self.detach(arena, prev, current, next);
                return Some(current);
            }
            prev = Some(current);
            cursor = next;
        }
        None
    }

    /// Destroys parked entries idle for more than `threshold` frames and not bound.
    /// Survivors keep their relative order.
    pub fn purge_idle<T>(
        &mut self,
        arena: &mut Arena<T>,
        clock: &FrameClock,
        threshold: u32,
        liveness: &dyn Liveness,
    ) -> usize {
        let mut destroyed = 0;
        let mut prev: Option<EntryId> = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let next = arena.next(current);
            let idle = arena
                .get(current)
                .is_some_and(|entry| clock.frames_since(entry.frame_last_used) > threshold);
            if idle && !liveness.is_bound(current) {
                self.detach(arena, prev, current, next);
                arena.remove(current);
                destroyed += 1;
            } else {
                prev = Some(current);
            }
            cursor = next;
        }
        destroyed
    }

    pub fn destroy_all<T>(&mut self, arena: &mut Arena<T>) -> usize {
        let mut destroyed = 0;
        while let Some(id) = self.head {
            self.head = arena.next(id);
            arena.remove(id);
            destroyed += 1;
        }
        self.len = 0;
        destroyed
    }

    fn detach<T>(
        &mut self,
        arena: &mut Arena<T>,
        prev: Option<EntryId>,
        id: EntryId,
        next: Option<EntryId>,
    ) {
        match prev {
            Some(prev) => arena.set_next(prev, next),
            None => self.head = next,
        }
        arena.set_next(id, None);
        self.len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CacheEntry;
    use crate::units::Unbound;

    struct Pinned(EntryId);

    impl Liveness for Pinned {
        fn is_bound(&self, id: EntryId) -> bool {
            id == self.0
        }
    }

    fn park(arena: &mut Arena<u8>, pool: &mut RecyclePool, w: u32, h: u32, frame: u32) -> EntryId {
        let mut entry = CacheEntry::new(0u8, w, h);
        entry.frame_last_used = frame;
        let id = arena.insert(entry, Residency::Indexed);
        assert!(!pool.recycle(arena, id));
        id
    }

    #[test]
    fn revive_is_lifo_and_matches_exact_extent() {
        let mut arena = Arena::new();
        let mut pool = RecyclePool::new();
        let older = park(&mut arena, &mut pool, 64, 64, 0);
        let other = park(&mut arena, &mut pool, 32, 32, 0);
        let newer = park(&mut arena, &mut pool, 64, 64, 0);

        assert_eq!(pool.revive(&mut arena, 64, 32), None);
        assert_eq!(pool.revive(&mut arena, 64, 64), Some(newer));
        assert_eq!(pool.revive(&mut arena, 64, 64), Some(older));
        assert_eq!(pool.revive(&mut arena, 64, 64), None);
        assert_eq!(pool.ids(&arena), vec![other]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn recycle_destroys_entries_without_resource() {
        let mut arena: Arena<u8> = Arena::new();
        let mut pool = RecyclePool::new();
        let mut entry = CacheEntry::new(0u8, 8, 8);
        entry.texture = None;
        let id = arena.insert(entry, Residency::Indexed);
        assert!(pool.recycle(&mut arena, id));
        assert!(arena.get(id).is_none());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn recycle_drops_enhanced_copy() {
        let mut arena = Arena::new();
        let mut pool = RecyclePool::new();
        let mut entry = CacheEntry::new(0u8, 8, 8);
        entry.set_enhanced(2, 9u8);
        let id = arena.insert(entry, Residency::Indexed);
        pool.recycle(&mut arena, id);
        assert!(arena.get(id).expect("parked entry").enhanced_texture().is_none());
        assert_eq!(arena.residency(id), Some(Residency::Pooled));
    }

    #[test]
    fn purge_keeps_young_and_bound_entries_in_order() {
        let mut arena = Arena::new();
        let mut pool = RecyclePool::new();
        let stale = park(&mut arena, &mut pool, 8, 8, 0);
        let young = park(&mut arena, &mut pool, 8, 8, 950);
        let pinned = park(&mut arena, &mut pool, 8, 8, 0);
        let stale_too = park(&mut arena, &mut pool, 8, 8, 10);

        let clock = FrameClock {
            dlist_count: 1000,
            ..FrameClock::default()
        };
        let destroyed = pool.purge_idle(&mut arena, &clock, 900, &Pinned(pinned));
        assert_eq!(destroyed, 2);
        assert_eq!(pool.ids(&arena), vec![pinned, young]);
        assert!(arena.get(stale).is_none());
        assert!(arena.get(stale_too).is_none());

        assert_eq!(pool.purge_idle(&mut arena, &clock, 900, &Pinned(pinned)), 0);
    }

    #[test]
    fn purge_threshold_is_strict() {
        let mut arena = Arena::new();
        let mut pool = RecyclePool::new();
        park(&mut arena, &mut pool, 8, 8, 100);
        let clock = FrameClock {
            dlist_count: 1000,
            ..FrameClock::default()
        };
        assert_eq!(pool.purge_idle(&mut arena, &clock, 900, &Unbound), 0);
        let later = FrameClock {
            dlist_count: 1001,
            ..clock
        };
        assert_eq!(pool.purge_idle(&mut arena, &later, 900, &Unbound), 1);
    }

    #[test]
    fn destroy_all_empties_pool() {
        let mut arena = Arena::new();
        let mut pool = RecyclePool::new();
        park(&mut arena, &mut pool, 8, 8, 0);
        park(&mut arena, &mut pool, 16, 16, 0);
        assert_eq!(pool.destroy_all(&mut arena), 2);
        assert_eq!(pool.len(), 0);
        assert_eq!(arena.len(), 0);
    }
}
