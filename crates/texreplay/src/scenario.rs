//! Seeded synthetic workload.
//!
//! Textures are split into groups; during each scene one group goes unused,
//! so a full cycle exercises eviction, revival and reloads.

use rand::rngs::StdRng;
use rand::Rng;
use texcache::{PixelSize, Rdram, TextureDescriptor, TextureFormat};

/// Bytes of memory reserved per texture.
const SLOT: u32 = 0x1000;
pub const GROUPS: u32 = 4;
pub const SCENE_FRAMES: u32 = 60;

pub struct Workload {
    pub descriptors: Vec<TextureDescriptor>,
    pub rdram: Rdram,
}

impl Workload {
    pub fn generate(textures: u32, rng: &mut StdRng) -> Self {
        let mut rdram = Rdram::new(SLOT as usize * (textures as usize + 1));
        rng.fill(rdram.as_bytes_mut());
        let descriptors = (0..textures).map(|i| descriptor(i, rng)).collect();
        Self { descriptors, rdram }
    }

    /// Textures requested during `frame`.
    pub fn active(&self, frame: u32) -> impl Iterator<Item = usize> {
        let idle_group = (frame / SCENE_FRAMES) % GROUPS;
        (0..self.descriptors.len()).filter(move |&i| i as u32 % GROUPS != idle_group)
    }

    /// Overwrites the first loaded row of texture `index` with fresh bytes.
    pub fn rewrite(&mut self, index: usize, rng: &mut StdRng) -> bool {
        let Some(desc) = self.descriptors.get(index) else {
            return false;
        };
        let region = desc.source_region();
        let data: Vec<u8> = (0..region.row_bytes()).map(|_| rng.gen()).collect();
        self.rdram.write(region.row_address(0), &data)
    }
}

fn descriptor(i: u32, rng: &mut StdRng) -> TextureDescriptor {
    let address = SLOT * (i + 1);
    let shift_s = rng.gen_range(2..=4);
    let shift_t = rng.gen_range(2..=4);
    let (format, size) = if i % 3 == 2 {
        (TextureFormat::I, PixelSize::Bits8)
    } else {
        (TextureFormat::Rgba, PixelSize::Bits32)
    };
    let mut desc = TextureDescriptor::new(address, format, size, 1 << shift_s, 1 << shift_t);
    match rng.gen_range(0..3) {
        0 => {}
        1 => {
            desc.width_to_create *= 2;
            desc.mask_s = shift_s;
            desc.mirror_s = rng.gen_bool(0.5);
        }
        _ => {
            desc.height_to_create *= 2;
            desc.mask_t = shift_t;
            desc.clamp_t = rng.gen_bool(0.5);
        }
    }
    desc
}
