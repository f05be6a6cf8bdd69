use crate::arena::EntryId;
use crate::manager::TextureRef;

/// Texture units the renderer can bind at once.
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Answers whether an entry is referenced by the active rendering pass.
/// Bound entries are never evicted or destroyed, whatever their age.
pub trait Liveness {
    fn is_bound(&self, id: EntryId) -> bool;
}

/// Liveness oracle for callers that keep no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

impl Liveness for Unbound {
    fn is_bound(&self, _id: EntryId) -> bool {
        false
    }
}

/// The set of currently bound texture units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureUnits {
    slots: [Option<TextureRef>; MAX_TEXTURE_UNITS],
}

impl TextureUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `unit` is out of range.
    pub fn bind(&mut self, unit: usize, texture: TextureRef) -> bool {
        match self.slots.get_mut(unit) {
            Some(slot) => {
                *slot = Some(texture);
                true
            }
            None => false,
        }
    }

    pub fn unbind(&mut self, unit: usize) {
        if let Some(slot) = self.slots.get_mut(unit) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None; MAX_TEXTURE_UNITS];
    }

    pub fn bound(&self, unit: usize) -> Option<TextureRef> {
        self.slots.get(unit).copied().flatten()
    }
}

impl Liveness for TextureUnits {
    fn is_bound(&self, id: EntryId) -> bool {
        self.slots
            .iter()
            .any(|slot| *slot == Some(TextureRef::Entry(id)))
    }
}
