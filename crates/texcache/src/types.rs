use std::fmt;

/// Pixel layout of a texture in source memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    Rgba,
    Yuv,
    /// Color-index: pixels are palette indices.
    Ci,
    Ia,
    I,
    Reserved5,
    Reserved6,
    Reserved7,
}

impl TextureFormat {
    pub const COUNT: usize = 8;

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Self::Rgba,
            1 => Self::Yuv,
            2 => Self::Ci,
            3 => Self::Ia,
            4 => Self::I,
            5 => Self::Reserved5,
            6 => Self::Reserved6,
            _ => Self::Reserved7,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rgba => "RGBA",
            Self::Yuv => "YUV",
            Self::Ci => "CI",
            Self::Ia => "IA",
            Self::I => "I",
            Self::Reserved5 => "?1",
            Self::Reserved6 => "?2",
            Self::Reserved7 => "?3",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bits per source pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PixelSize {
    #[default]
    Bits4,
    Bits8,
    Bits16,
    Bits32,
}

impl PixelSize {
    pub const COUNT: usize = 4;

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Bits4,
            1 => Self::Bits8,
            2 => Self::Bits16,
            _ => Self::Bits32,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bits(self) -> u32 {
        4 << self.index()
    }

    /// Bytes covered by `pixels` consecutive pixels of this size.
    pub fn bytes_for(self, pixels: u32) -> u32 {
        (pixels << self.index()) >> 1
    }
}

/// Rectangle of source memory handed to the checksum and color-index scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub address: u32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub size: PixelSize,
    /// Row stride in bytes.
    pub pitch: u32,
}

impl Region {
    pub fn row_bytes(&self) -> usize {
        self.size.bytes_for(self.width) as usize
    }

    /// Absolute address of the first byte of row `y` (relative to `top`).
    pub fn row_address(&self, y: u32) -> u32 {
        self.address
            .wrapping_add(self.top.wrapping_add(y).wrapping_mul(self.pitch))
            .wrapping_add(self.size.bytes_for(self.left))
    }
}

/// Full description of one texture fetch. Two descriptors describe the same
/// cached texture only when every field matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureDescriptor {
    pub address: u32,
    pub format: TextureFormat,
    pub size: PixelSize,
    pub left_to_load: u32,
    pub top_to_load: u32,
    pub width_to_load: u32,
    pub height_to_load: u32,
    pub width_to_create: u32,
    pub height_to_create: u32,
    /// Source row stride in bytes.
    pub pitch: u32,
    pub pal_address: u32,
    /// 16-entry palette selector used by 4-bit color-index textures.
    pub palette: u32,
    pub tlut_format: u32,
    pub mask_s: u32,
    pub mask_t: u32,
    pub mirror_s: bool,
    pub mirror_t: bool,
    pub clamp_s: bool,
    pub clamp_t: bool,
}

impl TextureDescriptor {
    /// A tightly packed texture whose loaded and created extents coincide.
    pub fn new(address: u32, format: TextureFormat, size: PixelSize, width: u32, height: u32) -> Self {
        Self {
            address,
            format,
            size,
            width_to_load: width,
            height_to_load: height,
            width_to_create: width,
            height_to_create: height,
            pitch: size.bytes_for(width),
            ..Self::default()
        }
    }

    /// Whether the texture's colors come from a palette and the palette checksum applies.
    pub fn uses_palette(&self) -> bool {
        self.format == TextureFormat::Ci
            || (self.format == TextureFormat::Rgba && self.size <= PixelSize::Bits8)
    }

    pub fn source_region(&self) -> Region {
        Region {
            address: self.address,
            left: self.left_to_load,
            top: self.top_to_load,
            width: self.width_to_load,
            height: self.height_to_load,
            size: self.size,
            pitch: self.pitch,
        }
    }

    /// The palette entries actually reachable from indices `0..=max_ci`.
    pub fn palette_region(&self, max_ci: u8) -> Region {
        let (entries, offset) = if self.size == PixelSize::Bits8 {
            (256, 0)
        } else {
            (16, self.palette << 4)
        };
        Region {
            address: self.pal_address.wrapping_add(offset * 2),
            left: 0,
            top: 0,
            width: u32::from(max_ci) + 1,
            height: 1,
            size: PixelSize::Bits16,
            pitch: entries * 2,
        }
    }
}
