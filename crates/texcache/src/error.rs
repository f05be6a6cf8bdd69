use thiserror::Error;

/// Failure reported by a pixel conversion function or a render-target load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("source range {address:#010x}+{len} is outside texture memory")]
    OutOfRange { address: u32, len: usize },
    #[error("malformed texture data: {0}")]
    Malformed(String),
}

/// Why [`crate::TextureManager::get_texture`] could not produce a texture.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture cache is not initialised")]
    Uninitialized,
    #[error("unable to create {width} x {height} texture")]
    Allocation { width: u32, height: u32 },
    #[error("texture decompression failed")]
    Decode(#[source] DecodeError),
    #[error("loading from render target failed")]
    RenderTarget(#[source] DecodeError),
    #[error("cache entry handle is no longer live")]
    StaleHandle,
}

impl TextureError {
    /// Whether the failed entry stays indexed and will be reconverted on the next request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TextureError::Decode(_) | TextureError::RenderTarget(_))
    }
}
