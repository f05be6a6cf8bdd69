use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::surface::Surface;
use crate::types::TextureDescriptor;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to prepare dump directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture has no pixels to dump")]
    EmptySurface,
}

/// Receives every freshly decoded texture.
pub trait TextureDumper {
    fn dump(
        &mut self,
        descriptor: &TextureDescriptor,
        crc: u32,
        surface: &Surface<'_>,
    ) -> Result<(), DumpError>;
}

/// Writes decoded textures as PNG files into a directory.
#[derive(Debug, Clone)]
pub struct PngDumper {
    dir: PathBuf,
}

impl PngDumper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(descriptor: &TextureDescriptor, crc: u32) -> String {
        format!(
            "{:08X}_{}_{}_{:08X}.png",
            descriptor.address,
            descriptor.format,
            descriptor.size.bits(),
            crc
        )
    }
}

impl TextureDumper for PngDumper {
    fn dump(
        &mut self,
        descriptor: &TextureDescriptor,
        crc: u32,
        surface: &Surface<'_>,
    ) -> Result<(), DumpError> {
        let width = descriptor.width_to_create.min(surface.width());
        let height = descriptor.height_to_create.min(surface.height());
        if width == 0 || height == 0 {
            return Err(DumpError::EmptySurface);
        }
        fs::create_dir_all(&self.dir).map_err(|source| DumpError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let image = RgbaImage::from_fn(width, height, |x, y| {
            let [a, r, g, b] = surface.get(x, y).to_be_bytes();
            Rgba([r, g, b, a])
        });
        let path = self.dir.join(Self::file_name(descriptor, crc));
        image
            .save(&path)
            .map_err(|source| DumpError::Image { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PixelSize, TextureFormat};

    #[test]
    fn file_name_encodes_identity() {
        let desc = TextureDescriptor::new(0x0012_3450, TextureFormat::Ci, PixelSize::Bits8, 8, 8);
        assert_eq!(PngDumper::file_name(&desc, 0xdead_beef), "00123450_CI_8_DEADBEEF.png");
    }

    #[test]
    fn writes_png_with_rgba_channels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut dumper = PngDumper::new(dir.path().join("dumps"));
        let desc = TextureDescriptor::new(0x100, TextureFormat::Rgba, PixelSize::Bits32, 2, 1);
        let mut pixels = [0x80ff_0000u32, 0xff00_00ff];
        let surface = Surface::new(&mut pixels, 2, 1, 2);
        dumper.dump(&desc, 7, &surface).expect("dump texture");

        let path = dir.path().join("dumps").join("00000100_RGBA_32_00000007.png");
        let image = image::open(&path).expect("open dump").to_rgba8();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0xff, 0, 0, 0x80]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([0, 0, 0xff, 0xff]));
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut dumper = PngDumper::new(dir.path());
        let desc = TextureDescriptor::default();
        let mut pixels = [0u32; 1];
        let surface = Surface::new(&mut pixels, 1, 1, 1);
        assert!(matches!(
            dumper.dump(&desc, 0, &surface),
            Err(DumpError::EmptySurface)
        ));
    }
}
