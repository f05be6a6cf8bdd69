//! Render-target collaborator.
//!
//! Textures are sometimes sampled from memory the renderer has itself drawn
//! into. Such fetches are redirected to the live render target instead of
//! decoding stale memory contents.

use crate::error::DecodeError;
use crate::surface::Surface;
use crate::types::{PixelSize, TextureDescriptor, TextureFormat};

/// Per-target metadata the cache needs to decide about redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetInfo {
    pub has_texture: bool,
    /// Format of the color image the target was rendered as.
    pub format: TextureFormat,
    pub size: PixelSize,
    /// Display list count at which the target was last drawn.
    pub update_at_frame: u32,
    /// Memory checksum taken when the target was last written back.
    pub crc_in_rdram: u32,
}

impl RenderTargetInfo {
    /// A target can stand in for a texture of the same format and pixel size.
    pub fn matches(&self, descriptor: &TextureDescriptor) -> bool {
        self.has_texture && self.format == descriptor.format && self.size == descriptor.size
    }
}

pub trait RenderTargets {
    fn find_render_target(&self, address: u32) -> Option<usize>;
    /// `extent` is the number of bytes the texture spans from `address`.
    fn find_back_buffer(&self, address: u32, extent: u32) -> Option<usize>;
    fn info(&self, index: usize) -> Option<RenderTargetInfo>;
    /// Records the descriptor the target is now being sampled as.
    fn redirect(&mut self, index: usize, descriptor: &TextureDescriptor);
    /// Copies the target's pixels into a cache entry's texture.
    fn load_into(
        &mut self,
        index: usize,
        surface: &mut Surface<'_>,
        descriptor: &TextureDescriptor,
    ) -> Result<(), DecodeError>;
}

/// Render-target collaborator for configurations without frame-buffer emulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderTargets;

impl RenderTargets for NoRenderTargets {
    fn find_render_target(&self, _address: u32) -> Option<usize> {
        None
    }

    fn find_back_buffer(&self, _address: u32, _extent: u32) -> Option<usize> {
        None
    }

    fn info(&self, _index: usize) -> Option<RenderTargetInfo> {
        None
    }

    fn redirect(&mut self, _index: usize, _descriptor: &TextureDescriptor) {}

    fn load_into(
        &mut self,
        _index: usize,
        _surface: &mut Surface<'_>,
        _descriptor: &TextureDescriptor,
    ) -> Result<(), DecodeError> {
        Ok(())
    }
}
