//! Minimal decoders registered by the harness.

use texcache::{
    ConvertTable, DecodeError, PixelSize, Surface, TextureDescriptor, TextureFormat, TextureMemory,
};

pub fn table() -> ConvertTable {
    let mut table = ConvertTable::new();
    table
        .register_all(TextureFormat::Rgba, PixelSize::Bits32, rgba32)
        .register_all(TextureFormat::I, PixelSize::Bits8, intensity8);
    table
}

fn rows<'m>(
    desc: &TextureDescriptor,
    memory: &'m dyn TextureMemory,
    count: u32,
) -> impl Iterator<Item = Result<(u32, &'m [u8]), DecodeError>> + 'm {
    let region = desc.source_region();
    (0..count).map(move |y| {
        let address = region.row_address(y);
        let len = region.row_bytes();
        memory
            .read(address, len)
            .map(|bytes| (y, bytes))
            .ok_or(DecodeError::OutOfRange { address, len })
    })
}

fn rgba32(
    surface: &mut Surface<'_>,
    desc: &TextureDescriptor,
    memory: &dyn TextureMemory,
) -> Result<(), DecodeError> {
    let width = surface.width() as usize;
    for row in rows(desc, memory, desc.height_to_load.min(surface.height())) {
        let (y, bytes) = row?;
        let out = surface.row_mut(y);
        for (texel, px) in out.iter_mut().zip(bytes.chunks_exact(4)).take(width) {
            *texel = u32::from_be_bytes([px[3], px[0], px[1], px[2]]);
        }
    }
    Ok(())
}

fn intensity8(
    surface: &mut Surface<'_>,
    desc: &TextureDescriptor,
    memory: &dyn TextureMemory,
) -> Result<(), DecodeError> {
    let width = surface.width() as usize;
    for row in rows(desc, memory, desc.height_to_load.min(surface.height())) {
        let (y, bytes) = row?;
        let out = surface.row_mut(y);
        for (texel, &i) in out.iter_mut().zip(bytes).take(width) {
            *texel = u32::from_be_bytes([i, i, i, i]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use texcache::{Rdram, TileState};

    #[test]
    fn decodes_both_registered_formats() {
        let table = table();
        let mut memory = Rdram::new(64);
        assert!(memory.write(0, &[0x10, 0x20, 0x30, 0x40, 0x7f]));

        let desc = TextureDescriptor::new(0, TextureFormat::Rgba, PixelSize::Bits32, 1, 1);
        let convert = table
            .select(&desc, false, true, TileState::default())
            .expect("rgba32 registered");
        let mut pixels = [0u32; 1];
        convert(&mut Surface::new(&mut pixels, 1, 1, 1), &desc, &memory).expect("decode");
        assert_eq!(pixels[0], 0x4010_2030);

        let desc = TextureDescriptor::new(4, TextureFormat::I, PixelSize::Bits8, 1, 1);
        let convert = table
            .select(&desc, false, true, TileState::default())
            .expect("i8 registered");
        convert(&mut Surface::new(&mut pixels, 1, 1, 1), &desc, &memory).expect("decode");
        assert_eq!(pixels[0], 0x7f7f_7f7f);
    }

    #[test]
    fn unmapped_rows_fail() {
        let memory = Rdram::new(4);
        let desc = TextureDescriptor::new(0, TextureFormat::Rgba, PixelSize::Bits32, 2, 1);
        let mut pixels = [0u32; 2];
        let err = rgba32(&mut Surface::new(&mut pixels, 2, 1, 2), &desc, &memory)
            .expect_err("row is out of range");
        assert!(matches!(err, DecodeError::OutOfRange { address: 0, len: 8 }));
    }
}
