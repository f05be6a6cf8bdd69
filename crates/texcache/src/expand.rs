//! Edge replication.
//!
//! A texture is often decoded at a smaller extent than the one it is sampled
//! at. These routines fill the rest of the allocated surface, one axis at a
//! time, by clamping to the last loaded texel, wrapping with the tile's mask
//! period, or mirroring around it.

use crate::surface::{Surface, TextureResource};
use crate::types::TextureDescriptor;

/// Largest mask honoured by both the plan and the pixel operations.
const MAX_MASK: u32 = 30;

/// Repeat period for a tile mask.
fn period(mask: u32) -> u32 {
    1 << mask.min(MAX_MASK)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Columns.
    S,
    /// Rows.
    T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    Wrap,
    Mirror,
}

/// Extents and addressing flags of a texture along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisExtent {
    /// Texels holding decoded data.
    pub load: u32,
    /// Extent the texture is sampled at.
    pub create: u32,
    /// Extent the resource was actually allocated with.
    pub created: u32,
    /// log2 of the repeat period; zero disables repetition.
    pub mask: u32,
    pub mirror: bool,
    pub clamp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPlan {
    Untouched,
    Clamp {
        from: u32,
        to: u32,
    },
    Repeat {
        mode: RepeatMode,
        to: u32,
        /// Clamps the remainder up to this extent after repeating.
        clamp_to: Option<u32>,
    },
    /// Extents no addressing mode produces.
    Invalid,
}

impl AxisExtent {
    pub fn along(axis: Axis, descriptor: &TextureDescriptor, created: u32) -> Self {
        match axis {
            Axis::S => Self {
                load: descriptor.width_to_load,
                create: descriptor.width_to_create,
                created,
                mask: descriptor.mask_s,
                mirror: descriptor.mirror_s,
                clamp: descriptor.clamp_s,
            },
            Axis::T => Self {
                load: descriptor.height_to_load,
                create: descriptor.height_to_create,
                created,
                mask: descriptor.mask_t,
                mirror: descriptor.mirror_t,
                clamp: descriptor.clamp_t,
            },
        }
    }

    pub fn mask_width(&self) -> u32 {
        period(self.mask)
    }

    pub fn plan(&self) -> ExpandPlan {
        let (load, create, created) = (self.load, self.create, self.created);
        if load >= created {
            return ExpandPlan::Untouched;
        }
        if self.mask == 0 {
            return ExpandPlan::Clamp { from: load, to: created };
        }
        let mask_width = self.mask_width();

        if load == mask_width {
            let to = if self.clamp { create } else { created };
            let mode = if self.mirror {
                RepeatMode::Mirror
            } else {
                RepeatMode::Wrap
            };
            return ExpandPlan::Repeat {
                mode,
                to,
                clamp_to: (to < created).then_some(created),
            };
        }
        if load < create && create == mask_width && mask_width == created {
            return ExpandPlan::Repeat {
                mode: RepeatMode::Wrap,
                to: created,
                clamp_to: None,
            };
        }
        if load == create && create < mask_width {
            return ExpandPlan::Clamp { from: load, to: created };
        }
        if load < create && create < mask_width {
            return ExpandPlan::Clamp { from: load, to: created };
        }
        ExpandPlan::Invalid
    }
}

/// Extends a freshly decoded texture to its allocated extent, S first, then T.
pub fn expand_texture<T: TextureResource>(texture: &mut T, descriptor: &TextureDescriptor) {
    let width = texture.created_width();
    let height = texture.created_height();
    expand_axis(texture, descriptor, Axis::S, width, descriptor.height_to_load);
    expand_axis(texture, descriptor, Axis::T, height, width);
}

fn expand_axis<T: TextureResource>(
    texture: &mut T,
    descriptor: &TextureDescriptor,
    axis: Axis,
    created: u32,
    other: u32,
) {
    let extent = AxisExtent::along(axis, descriptor, created);
    let plan = extent.plan();
    if plan == ExpandPlan::Untouched {
        return;
    }
    let Some(mut surface) = texture.lock() else {
        tracing::warn!(address = descriptor.address, ?axis, "unable to lock texture for expansion");
        return;
    };
    apply(&mut surface, axis, &extent, plan, other);
}

/// Runs `plan` over a locked surface. `other` is the number of rows a column
/// operation touches; row operations copy whole rows.
pub fn apply(surface: &mut Surface<'_>, axis: Axis, extent: &AxisExtent, plan: ExpandPlan, other: u32) {
    match plan {
        ExpandPlan::Untouched => {}
        ExpandPlan::Clamp { from, to } => clamp(surface, axis, from, to, other),
        ExpandPlan::Repeat { mode, to, clamp_to } => {
            match mode {
                RepeatMode::Wrap => wrap(surface, axis, extent.load, extent.mask, to, other),
                RepeatMode::Mirror => mirror(surface, axis, extent.load, extent.mask, to, other),
            }
            if let Some(clamp_to) = clamp_to {
                clamp(surface, axis, to, clamp_to, other);
            }
        }
        ExpandPlan::Invalid => {
            tracing::warn!(
                ?axis,
                load = extent.load,
                create = extent.create,
                created = extent.created,
                mask = extent.mask,
                "inconsistent texture extents, clamping"
            );
            debug_assert_ne!(plan, ExpandPlan::Invalid, "inconsistent texture extents {extent:?}");
            clamp(surface, axis, extent.load, extent.created, other);
        }
    }
}

fn limit(surface: &Surface<'_>, axis: Axis) -> u32 {
    match axis {
        Axis::S => surface.width(),
        Axis::T => surface.height(),
    }
}

fn clamp(surface: &mut Surface<'_>, axis: Axis, size: u32, to: u32, rows: u32) {
    let to = to.min(limit(surface, axis));
    if size == 0 || size > to {
        return;
    }
    match axis {
        Axis::S => {
            for y in 0..rows.min(surface.height()) {
                let row = surface.row_mut(y);
                let edge = row[size as usize - 1];
                row[size as usize..to as usize].fill(edge);
            }
        }
        Axis::T => {
            for y in size..to {
                surface.copy_row(size - 1, y);
            }
        }
    }
}

fn wrap(surface: &mut Surface<'_>, axis: Axis, size: u32, mask: u32, to: u32, rows: u32) {
    let to = to.min(limit(surface, axis));
    let mask_val = period(mask) - 1;
    match axis {
        Axis::S => {
            for y in 0..rows.min(surface.height()) {
                let row = surface.row_mut(y);
                for x in size..to {
                    let m = x & mask_val;
                    let src = if m < size { m } else { to - m };
                    row[x as usize] = row[src as usize];
                }
            }
        }
        Axis::T => {
            for y in size..to {
                let src = if y > mask_val { y & mask_val } else { y - size };
                surface.copy_row(src, y);
            }
        }
    }
}

fn mirror(surface: &mut Surface<'_>, axis: Axis, size: u32, mask: u32, to: u32, rows: u32) {
    let to = to.min(limit(surface, axis));
    let half = period(mask) - 1;
    let full = (period(mask) << 1) - 1;
    let reflect = |i: u32| {
        if i & full <= half {
            i & half
        } else {
            full - (i & full)
        }
    };
    match axis {
        Axis::S => {
            for y in 0..rows.min(surface.height()) {
                let row = surface.row_mut(y);
                for x in size..to {
                    row[x as usize] = row[reflect(x) as usize];
                }
            }
        }
        Axis::T => {
            for y in size..to {
                surface.copy_row(reflect(y), y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SoftwareTexture;
    use crate::types::{PixelSize, TextureFormat};

    fn extent(load: u32, create: u32, created: u32, mask: u32) -> AxisExtent {
        AxisExtent {
            load,
            create,
            created,
            mask,
            mirror: false,
            clamp: false,
        }
    }

    /// A texture whose first `load_w` columns of the first `load_h` rows hold `x + 1 + 100 * y`.
    fn loaded(width: u32, height: u32, load_w: u32, load_h: u32) -> SoftwareTexture {
        let mut texture = SoftwareTexture::new(width, height);
        {
            let mut surface = texture.lock().expect("lock");
            for y in 0..load_h {
                for x in 0..load_w {
                    surface.set(x, y, x + 1 + 100 * y);
                }
            }
        }
        texture
    }

    fn descriptor(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor::new(0, TextureFormat::Rgba, PixelSize::Bits32, width, height)
    }

    #[test]
    fn plan_reproduces_case_table() {
        assert_eq!(extent(16, 16, 16, 4).plan(), ExpandPlan::Untouched);
        assert_eq!(
            extent(3, 3, 8, 0).plan(),
            ExpandPlan::Clamp { from: 3, to: 8 }
        );
        assert_eq!(
            extent(4, 8, 16, 2).plan(),
            ExpandPlan::Repeat {
                mode: RepeatMode::Wrap,
                to: 16,
                clamp_to: None
            }
        );
        assert_eq!(
            AxisExtent {
                clamp: true,
                mirror: true,
                ..extent(4, 8, 16, 2)
            }
            .plan(),
            ExpandPlan::Repeat {
                mode: RepeatMode::Mirror,
                to: 8,
                clamp_to: Some(16)
            }
        );
        assert_eq!(
            extent(3, 8, 8, 3).plan(),
            ExpandPlan::Repeat {
                mode: RepeatMode::Wrap,
                to: 8,
                clamp_to: None
            }
        );
        assert_eq!(
            extent(5, 5, 8, 4).plan(),
            ExpandPlan::Clamp { from: 5, to: 8 }
        );
        assert_eq!(
            extent(3, 6, 8, 4).plan(),
            ExpandPlan::Clamp { from: 3, to: 8 }
        );
        assert_eq!(extent(3, 6, 8, 2).plan(), ExpandPlan::Invalid);
        assert_eq!(extent(5, 8, 8, 2).plan(), ExpandPlan::Invalid);
    }

    #[test]
    fn oversized_mask_saturates_to_one_period() {
        assert_eq!(period(MAX_MASK + 5), period(MAX_MASK));
        let wide = extent(1 << MAX_MASK, 1 << MAX_MASK, u32::MAX, 31);
        assert_eq!(wide.mask_width(), period(31));
        assert_eq!(
            wide.plan(),
            ExpandPlan::Repeat {
                mode: RepeatMode::Wrap,
                to: u32::MAX,
                clamp_to: None
            }
        );

        let mut mirrored = [1u32, 2, 3, 4];
        let mut surface = Surface::new(&mut mirrored, 4, 1, 4);
        mirror(&mut surface, Axis::S, 2, 31, 4, 1);
        assert_eq!(mirrored, [1, 2, 3, 4]);
    }

    #[test]
    fn wrap_repeats_with_mask_period() {
        let mut desc = descriptor(4, 2);
        desc.width_to_create = 16;
        desc.mask_s = 2;
        let mut texture = loaded(16, 2, 4, 2);
        expand_texture(&mut texture, &desc);
        for y in 0..2 {
            for x in 4..16 {
                assert_eq!(texture.pixel(x, y), texture.pixel(x % 4, y), "x={x} y={y}");
            }
        }
        assert_eq!(texture.pixel(4, 0), texture.pixel(0, 0));
    }

    #[test]
    fn mirror_reflects_at_period_boundary() {
        let mut desc = descriptor(4, 1);
        desc.width_to_create = 16;
        desc.mask_s = 2;
        desc.mirror_s = true;
        let mut texture = loaded(16, 1, 4, 1);
        expand_texture(&mut texture, &desc);
        assert_eq!(texture.pixel(4, 0), texture.pixel(3, 0));
        assert_eq!(texture.pixel(7, 0), texture.pixel(0, 0));
        assert_eq!(texture.pixel(8, 0), texture.pixel(0, 0));
        assert_eq!(texture.pixel(12, 0), texture.pixel(3, 0));
    }

    #[test]
    fn clamp_replicates_last_loaded_column() {
        let desc = TextureDescriptor {
            width_to_create: 8,
            ..descriptor(3, 2)
        };
        let mut texture = loaded(8, 2, 3, 2);
        expand_texture(&mut texture, &desc);
        for y in 0..2 {
            for x in 3..8 {
                assert_eq!(texture.pixel(x, y), texture.pixel(2, y));
            }
        }
    }

    #[test]
    fn repeat_then_clamp_remainder() {
        let mut desc = descriptor(4, 1);
        desc.width_to_create = 8;
        desc.mask_s = 2;
        desc.clamp_s = true;
        let mut texture = loaded(16, 1, 4, 1);
        expand_texture(&mut texture, &desc);
        assert_eq!(texture.pixel(5, 0), texture.pixel(1, 0));
        for x in 8..16 {
            assert_eq!(texture.pixel(x, 0), texture.pixel(7, 0));
        }
    }

    #[test]
    fn rows_mirror_along_t() {
        let mut desc = descriptor(4, 2);
        desc.height_to_create = 8;
        desc.mask_t = 1;
        desc.mirror_t = true;
        let mut texture = loaded(4, 8, 4, 2);
        expand_texture(&mut texture, &desc);
        for x in 0..4 {
            assert_eq!(texture.pixel(x, 2), texture.pixel(x, 1));
            assert_eq!(texture.pixel(x, 3), texture.pixel(x, 0));
            assert_eq!(texture.pixel(x, 4), texture.pixel(x, 0));
            assert_eq!(texture.pixel(x, 7), texture.pixel(x, 0));
        }
    }

    #[test]
    fn rows_clamp_along_t() {
        let desc = TextureDescriptor {
            height_to_create: 6,
            ..descriptor(2, 3)
        };
        let mut texture = loaded(2, 6, 2, 3);
        expand_texture(&mut texture, &desc);
        for y in 3..6 {
            assert_eq!(texture.pixel(0, y), texture.pixel(0, 2));
            assert_eq!(texture.pixel(1, y), texture.pixel(1, 2));
        }
    }

    #[test]
    fn zero_load_is_left_alone() {
        let mut pixels = [7u32; 4];
        let mut surface = Surface::new(&mut pixels, 4, 1, 4);
        let ext = extent(0, 0, 4, 0);
        apply(&mut surface, Axis::S, &ext, ext.plan(), 1);
        assert_eq!(pixels, [7; 4]);
    }
}
