//! Pixel conversion dispatch.
//!
//! Decoding a source bit layout is left to externally supplied functions.
//! The cache only picks one out of three format-by-size tables and calls it.

use std::fmt;

use crate::error::DecodeError;
use crate::memory::TextureMemory;
use crate::surface::Surface;
use crate::types::{PixelSize, TextureDescriptor, TextureFormat};

/// Decodes `descriptor`'s source pixels from `memory` into the locked texture.
pub type ConvertFn =
    fn(&mut Surface<'_>, &TextureDescriptor, &dyn TextureMemory) -> Result<(), DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertTableKind {
    /// Loads straight from the on-chip texture memory image.
    FullTmem,
    Standard,
    /// Palette lookup through the TLUT.
    Tlut,
}

/// Rasteriser state that influences table selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileState {
    pub tile7_is_yuv: bool,
    pub tlut_mode: u32,
}

type Table = [[Option<ConvertFn>; PixelSize::COUNT]; TextureFormat::COUNT];

#[derive(Clone, Default)]
pub struct ConvertTable {
    full_tmem: Table,
    standard: Table,
    tlut: Table,
}

impl fmt::Debug for ConvertTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |table: &Table| table.iter().flatten().filter(|f| f.is_some()).count();
        f.debug_struct("ConvertTable")
            .field("full_tmem", &count(&self.full_tmem))
            .field("standard", &count(&self.standard))
            .field("tlut", &count(&self.tlut))
            .finish()
    }
}

impl ConvertTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: ConvertTableKind,
        format: TextureFormat,
        size: PixelSize,
        convert: ConvertFn,
    ) -> &mut Self {
        self.table_mut(kind)[format.index()][size.index()] = Some(convert);
        self
    }

    /// Registers the same function in the standard and TLUT tables.
    pub fn register_all(
        &mut self,
        format: TextureFormat,
        size: PixelSize,
        convert: ConvertFn,
    ) -> &mut Self {
        self.register(ConvertTableKind::Standard, format, size, convert)
            .register(ConvertTableKind::Tlut, format, size, convert)
    }

    pub fn get(
        &self,
        kind: ConvertTableKind,
        format: TextureFormat,
        size: PixelSize,
    ) -> Option<ConvertFn> {
        self.table(kind)[format.index()][size.index()]
    }

    /// Chooses the function for a fresh load of `descriptor`.
    pub fn select(
        &self,
        descriptor: &TextureDescriptor,
        from_tmem: bool,
        allow_tmem: bool,
        tile: TileState,
    ) -> Option<ConvertFn> {
        if from_tmem && allow_tmem {
            return self.get(ConvertTableKind::FullTmem, descriptor.format, descriptor.size);
        }
        let format = if tile.tile7_is_yuv {
            TextureFormat::Yuv
        } else {
            descriptor.format
        };
        let kind = if tile.tlut_mode >= 2 {
            ConvertTableKind::Tlut
        } else {
            ConvertTableKind::Standard
        };
        self.get(kind, format, descriptor.size)
    }

    fn table(&self, kind: ConvertTableKind) -> &Table {
        match kind {
            ConvertTableKind::FullTmem => &self.full_tmem,
            ConvertTableKind::Standard => &self.standard,
            ConvertTableKind::Tlut => &self.tlut,
        }
    }

    fn table_mut(&mut self, kind: ConvertTableKind) -> &mut Table {
        match kind {
            ConvertTableKind::FullTmem => &mut self.full_tmem,
            ConvertTableKind::Standard => &mut self.standard,
            ConvertTableKind::Tlut => &mut self.tlut,
        }
    }
}

/// Rewrites ARGB pixels as grey intensity `(r + g + b) / 3`.
/// With `keep_alpha` unset the alpha channel becomes the intensity too.
pub fn rgba_to_intensity(surface: &mut Surface<'_>, keep_alpha: bool) {
    let width = surface.width() as usize;
    for y in 0..surface.height() {
        for pixel in &mut surface.row_mut(y)[..width] {
            let a = *pixel >> 24;
            let r = (*pixel >> 16) & 0xff;
            let g = (*pixel >> 8) & 0xff;
            let b = *pixel & 0xff;
            let i = (r + g + b) / 3;
            let a = if keep_alpha { a } else { i };
            *pixel = (a << 24) | (i << 16) | (i << 8) | i;
        }
    }
}
