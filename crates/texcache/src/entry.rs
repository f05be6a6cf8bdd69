use crate::clock::FrameClock;
use crate::types::TextureDescriptor;

/// State of the optional post-processed copy of an entry's texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enhancement {
    #[default]
    None,
    /// An external enhancer produced a texture; the tag is the enhancer's own.
    Applied(u32),
}

/// One resident texture.
///
/// The entry owns its GPU resource for its whole life: the resource is
/// created once, rewritten whenever the source content changes, parked with
/// the entry in the recycle pool and only released when the entry is
/// destroyed.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub(crate) descriptor: TextureDescriptor,
    pub(crate) texture: Option<T>,
    pub(crate) allocated: (u32, u32),
    pub(crate) crc: u32,
    pub(crate) pal_crc: u32,
    pub(crate) max_ci: Option<u8>,
    pub(crate) time_last_used: u32,
    pub(crate) frame_last_used: u32,
    pub(crate) external_checked: bool,
    pub(crate) enhancement: Enhancement,
    pub(crate) enhanced: Option<T>,
    pub(crate) needs_reload: bool,
}

impl<T> CacheEntry<T> {
    pub(crate) fn new(texture: T, width: u32, height: u32) -> Self {
        Self {
            descriptor: TextureDescriptor::default(),
            texture: Some(texture),
            allocated: (width, height),
            crc: 0,
            pal_crc: 0,
            max_ci: None,
            time_last_used: 0,
            frame_last_used: 0,
            external_checked: false,
            enhancement: Enhancement::None,
            enhanced: None,
            needs_reload: false,
        }
    }

    /// Prepares a new or revived entry for `address`.
    pub(crate) fn reset(&mut self, address: u32, clock: &FrameClock) {
        self.descriptor.address = address;
        self.time_last_used = clock.rdp_time;
        self.frame_last_used = clock.dlist_count;
        self.crc = 0;
        self.external_checked = false;
        self.max_ci = None;
    }

    pub(crate) fn touch(&mut self, clock: &FrameClock) {
        self.time_last_used = clock.rdp_time;
        self.frame_last_used = clock.dlist_count;
    }

    pub(crate) fn clear_enhancement(&mut self) {
        self.enhancement = Enhancement::None;
        self.enhanced = None;
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    pub fn texture_mut(&mut self) -> Option<&mut T> {
        self.texture.as_mut()
    }

    /// Extent the resource was requested at when the entry was first allocated.
    pub fn allocated_extent(&self) -> (u32, u32) {
        self.allocated
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn palette_crc(&self) -> u32 {
        self.pal_crc
    }

    pub fn max_color_index(&self) -> Option<u8> {
        self.max_ci
    }

    pub fn time_last_used(&self) -> u32 {
        self.time_last_used
    }

    pub fn frame_last_used(&self) -> u32 {
        self.frame_last_used
    }

    pub fn external_checked(&self) -> bool {
        self.external_checked
    }

    pub fn set_external_checked(&mut self, checked: bool) {
        self.external_checked = checked;
    }

    pub fn enhancement(&self) -> Enhancement {
        self.enhancement
    }

    pub fn enhanced_texture(&self) -> Option<&T> {
        self.enhanced.as_ref()
    }

    /// Attaches an enhanced copy; it is dropped on the next reload or recycle.
    pub fn set_enhanced(&mut self, tag: u32, texture: T) {
        self.enhancement = Enhancement::Applied(tag);
        self.enhanced = Some(texture);
    }
}
