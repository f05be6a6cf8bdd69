//! GPU resource seam.
//!
//! The cache never talks to a graphics API directly. A resource only has to
//! report the extent it was created at and hand out a locked 32-bit ARGB view
//! (`0xAARRGGBB`) for writing decoded pixels. Dropping the [`Surface`] ends
//! the update.

/// Locked, writable view of a texture's pixels.
pub struct Surface<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
    pitch: usize,
}

impl<'a> Surface<'a> {
    /// `pitch` is the row stride in pixels; `pixels` must hold `pitch * height` values.
    pub fn new(pixels: &'a mut [u32], width: u32, height: u32, pitch: usize) -> Self {
        debug_assert!(pitch >= width as usize);
        debug_assert!(pixels.len() >= pitch * height as usize);
        Self {
            pixels,
            width,
            height,
            pitch,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn row(&self, y: u32) -> &[u32] {
        let start = y as usize * self.pitch;
        &self.pixels[start..start + self.pitch]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = y as usize * self.pitch;
        &mut self.pixels[start..start + self.pitch]
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.row(y)[x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        self.row_mut(y)[x as usize] = value;
    }

    /// Copies a full row (including any padding up to the pitch).
    pub fn copy_row(&mut self, src: u32, dst: u32) {
        if src == dst {
            return;
        }
        let start = src as usize * self.pitch;
        self.pixels
            .copy_within(start..start + self.pitch, dst as usize * self.pitch);
    }

    pub fn fill(&mut self, value: u32) {
        self.pixels.fill(value);
    }
}

/// A GPU texture owned by a cache entry.
pub trait TextureResource {
    fn created_width(&self) -> u32;
    fn created_height(&self) -> u32;
    /// Begins an update. `None` means the resource cannot be written right now.
    fn lock(&mut self) -> Option<Surface<'_>>;
}

/// Creates GPU textures for new cache entries.
pub trait TextureAllocator {
    type Texture: TextureResource;

    /// `None` signals an allocation failure.
    fn allocate(&mut self, width: u32, height: u32) -> Option<Self::Texture>;
}

/// CPU-backed texture used by tests and the replay harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareTexture {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl SoftwareTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

impl TextureResource for SoftwareTexture {
    fn created_width(&self) -> u32 {
        self.width
    }

    fn created_height(&self) -> u32 {
        self.height
    }

    fn lock(&mut self) -> Option<Surface<'_>> {
        let pitch = self.width as usize;
        Some(Surface::new(&mut self.pixels, self.width, self.height, pitch))
    }
}

/// Allocates [`SoftwareTexture`]s.
///
/// Requests larger than `max_extent` are created at `max_extent`, the way a
/// device clamps to its maximum texture size. An optional budget limits how
/// many textures may be created before allocation starts failing.
#[derive(Debug, Clone)]
pub struct SoftwareAllocator {
    max_extent: u32,
    remaining: Option<usize>,
    allocated: usize,
}

impl SoftwareAllocator {
    pub fn new() -> Self {
        Self {
            max_extent: 1024,
            remaining: None,
            allocated: 0,
        }
    }

    pub fn with_max_extent(mut self, max_extent: u32) -> Self {
        self.max_extent = max_extent;
        self
    }

    pub fn with_budget(mut self, textures: usize) -> Self {
        self.remaining = Some(textures);
        self
    }

    /// Number of textures created so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

impl Default for SoftwareAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureAllocator for SoftwareAllocator {
    type Texture = SoftwareTexture;

    fn allocate(&mut self, width: u32, height: u32) -> Option<SoftwareTexture> {
        if width == 0 || height == 0 {
            return None;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.allocated += 1;
        Some(SoftwareTexture::new(
            width.min(self.max_extent),
            height.min(self.max_extent),
        ))
    }
}
