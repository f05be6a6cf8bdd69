//! Texture cache and recycling engine.
//!
//! [`TextureManager`] maps texture descriptors read by the command processor
//! to GPU textures. Live entries sit in a fixed-bucket hash index keyed by
//! source address; evicted entries keep their GPU resource in a LIFO recycle
//! pool until a texture of the same size needs one, or until they have sat
//! idle long enough to be destroyed. Decoding, GPU resources, render-target
//! tracking and source memory are all reached through traits.

mod arena;
mod clock;
mod convert;
mod dump;
mod entry;
mod error;
mod expand;
mod index;
mod manager;
mod memory;
mod pool;
mod stats;
mod surface;
mod targets;
mod types;
mod units;

pub use arena::{EntryId, Residency};
pub use clock::FrameClock;
pub use convert::{rgba_to_intensity, ConvertFn, ConvertTable, ConvertTableKind, TileState};
pub use dump::{DumpError, PngDumper, TextureDumper};
pub use entry::{CacheEntry, Enhancement};
pub use error::{DecodeError, TextureError};
pub use expand::{expand_texture, Axis, AxisExtent, ExpandPlan, RepeatMode};
pub use manager::{FrameContext, ManagerOptions, PurgeReport, TextureManager, TextureRef};
pub use memory::{Rdram, TextureMemory};
pub use stats::CacheStats;
pub use surface::{SoftwareAllocator, SoftwareTexture, Surface, TextureAllocator, TextureResource};
pub use targets::{NoRenderTargets, RenderTargetInfo, RenderTargets};
pub use types::{PixelSize, Region, TextureDescriptor, TextureFormat};
pub use units::{Liveness, TextureUnits, Unbound, MAX_TEXTURE_UNITS};
