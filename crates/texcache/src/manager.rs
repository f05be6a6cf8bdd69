//! The texture manager.
//!
//! Owns the arena, the cache index and the recycle pool, and turns texture
//! descriptors into up-to-date textures. Validity is decided by content
//! checksums over source memory, never by pointer identity: an indexed entry
//! is reused only while its content and palette checksums still match.

use texconfig::{CacheConfig, FrameBufferOptions};

use crate::arena::{Arena, EntryId, Residency};
use crate::clock::FrameClock;
use crate::convert::{rgba_to_intensity, ConvertTable, TileState};
use crate::dump::{PngDumper, TextureDumper};
use crate::entry::CacheEntry;
use crate::error::TextureError;
use crate::expand::expand_texture;
use crate::index::CacheIndex;
use crate::memory::TextureMemory;
use crate::pool::RecyclePool;
use crate::stats::CacheStats;
use crate::surface::{TextureAllocator, TextureResource};
use crate::targets::{RenderTargetInfo, RenderTargets};
use crate::types::{TextureDescriptor, TextureFormat};
use crate::units::Liveness;

/// What a successful fetch resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRef {
    Entry(EntryId),
    /// The fetch is served directly by a live render target.
    RenderTarget(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    pub buckets: usize,
    /// Idle frames before an indexed entry moves to the recycle pool.
    pub frames_to_kill: u32,
    /// Idle frames before a pooled entry is destroyed.
    pub frames_to_delete: u32,
    pub diagnostics: bool,
    pub frame_buffer: FrameBufferOptions,
    pub allow_tmem: bool,
}

impl From<&CacheConfig> for ManagerOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            buckets: config.cache.buckets,
            frames_to_kill: config.cache.frames_to_kill(),
            frames_to_delete: config.cache.frames_to_delete(),
            diagnostics: config.cache.diagnostics,
            frame_buffer: config.frame_buffer,
            allow_tmem: config.loading.allow_tmem,
        }
    }
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

/// Everything outside the cache that a fetch reads.
pub struct FrameContext<'a> {
    pub clock: &'a FrameClock,
    pub memory: &'a dyn TextureMemory,
    pub render_targets: &'a mut dyn RenderTargets,
    pub tile: TileState,
}

/// Outcome of one purge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Indexed entries moved to the recycle pool.
    pub evicted: usize,
    /// Pooled entries destroyed.
    pub destroyed: usize,
}

enum Probe {
    Miss,
    Redirect(usize),
    Stale(usize, RenderTargetInfo),
}

fn probe_render_target(targets: &dyn RenderTargets, descriptor: &TextureDescriptor) -> Probe {
    let Some(index) = targets.find_render_target(descriptor.address) else {
        return Probe::Miss;
    };
    match targets.info(index) {
        Some(info) if info.matches(descriptor) => Probe::Redirect(index),
        Some(info) => Probe::Stale(index, info),
        None => Probe::Miss,
    }
}

pub struct TextureManager<A: TextureAllocator> {
    allocator: A,
    arena: Arena<A::Texture>,
    index: CacheIndex,
    pool: RecyclePool,
    converters: ConvertTable,
    dumper: Option<Box<dyn TextureDumper>>,
    options: ManagerOptions,
    stats: CacheStats,
}

impl<A: TextureAllocator> TextureManager<A> {
    pub fn new(allocator: A, options: ManagerOptions, converters: ConvertTable) -> Self {
        Self {
            allocator,
            arena: Arena::new(),
            index: CacheIndex::new(options.buckets),
            pool: RecyclePool::new(),
            converters,
            dumper: None,
            options,
            stats: CacheStats::default(),
        }
    }

    /// Builds a manager from a validated configuration, dumping textures if it asks for that.
    pub fn from_config(allocator: A, config: &CacheConfig, converters: ConvertTable) -> Self {
        let manager = Self::new(allocator, ManagerOptions::from(config), converters);
        match (&config.loading.dump_dir, config.loading.dump_textures) {
            (Some(dir), true) => manager.with_dumper(Box::new(PngDumper::new(dir.clone()))),
            _ => manager,
        }
    }

    pub fn with_dumper(mut self, dumper: Box<dyn TextureDumper>) -> Self {
        self.dumper = Some(dumper);
        self
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_initialized()
    }

    pub fn entry(&self, id: EntryId) -> Option<&CacheEntry<A::Texture>> {
        self.arena.get(id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut CacheEntry<A::Texture>> {
        self.arena.get_mut(id)
    }

    /// `None` once the entry has been destroyed.
    pub fn residency(&self, id: EntryId) -> Option<Residency> {
        self.arena.residency(id)
    }

    /// The indexed entry cached under exactly this descriptor.
    pub fn lookup(&self, descriptor: &TextureDescriptor) -> Option<EntryId> {
        self.index.lookup(&self.arena, descriptor)
    }

    pub fn indexed_len(&self) -> usize {
        self.arena.len() - self.pool.len()
    }

    pub fn pooled_len(&self) -> usize {
        self.pool.len()
    }

    /// Returns an up-to-date texture for `descriptor`.
    ///
    /// A matching entry whose checksums still agree with source memory is
    /// returned untouched. Otherwise an entry is revived from the recycle pool
    /// or allocated, and its pixels are converted again. With `auto_extend`
    /// the loaded area is replicated out to the full texture.
    pub fn get_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        from_tmem: bool,
        auto_extend: bool,
        ctx: &mut FrameContext<'_>,
    ) -> Result<TextureRef, TextureError> {
        if !self.index.is_initialized() {
            return Err(TextureError::Uninitialized);
        }
        let clock = *ctx.clock;
        let mut found = self.index.lookup(&self.arena, descriptor);

        let fb = self.options.frame_buffer;
        let mut target: Option<(usize, RenderTargetInfo)> = None;
        if fb.probes_render_targets() {
            match probe_render_target(&*ctx.render_targets, descriptor) {
                Probe::Redirect(index) => return Ok(self.redirect(index, descriptor, ctx)),
                Probe::Stale(index, info) => target = Some((index, info)),
                Probe::Miss => {}
            }
        }
        if fb.check_back_buffers && !fb.write_back_buffer_to_rdram {
            let extent = descriptor.height_to_load.wrapping_mul(descriptor.pitch);
            if ctx
                .render_targets
                .find_back_buffer(descriptor.address, extent)
                .is_some()
            {
                match probe_render_target(&*ctx.render_targets, descriptor) {
                    Probe::Redirect(index) => return Ok(self.redirect(index, descriptor, ctx)),
                    Probe::Stale(index, info) => target = Some((index, info)),
                    Probe::Miss => {}
                }
            }
        }

        let crc = match found.and_then(|id| self.arena.get(id)) {
            Some(entry)
                if entry.time_last_used == clock.rdp_time
                    && clock.dlist_count != 0
                    && !clock.frame_buffer_in_use =>
            {
                entry.crc
            }
            _ => match target {
                Some((_, info)) => info.crc_in_rdram,
                None => ctx.memory.checksum(&descriptor.source_region()),
            },
        };

        let mut max_ci = None;
        let mut pal_crc = 0;
        if descriptor.uses_palette() {
            let known = found
                .and_then(|id| self.arena.get(id))
                .filter(|entry| entry.crc == crc)
                .and_then(|entry| entry.max_ci);
            let ci = match known {
                Some(ci) => ci,
                None => ctx.memory.max_color_index(&descriptor.source_region()),
            };
            pal_crc = ctx.memory.checksum(&descriptor.palette_region(ci));
            max_ci = Some(ci);
        }

        let current = |entry: &CacheEntry<A::Texture>| match target {
            Some((_, info)) => info.update_at_frame < entry.frame_last_used,
            None => true,
        };

        // Textures sharing an address with different palettes: keep walking
        // the bucket from the partial match for one whose palette agrees too.
        if let Some(id) = found {
            let partial = self
                .arena
                .get(id)
                .is_some_and(|entry| entry.crc == crc && entry.pal_crc != pal_crc && current(entry));
            if partial {
                found = self.arena.chain(self.arena.next(id)).find(|&next| {
                    self.arena.get(next).is_some_and(|entry| {
                        entry.crc == crc && entry.pal_crc == pal_crc && current(entry)
                    })
                });
            }
        }

        if let Some((id, entry)) = found.and_then(|id| self.arena.get_mut(id).map(|entry| (id, entry))) {
            if !entry.needs_reload && entry.crc == crc && entry.pal_crc == pal_crc && current(&*entry) {
                entry.touch(&clock);
                self.stats.hits += 1;
                tracing::trace!(address = descriptor.address, "using cached texture");
                return Ok(TextureRef::Entry(id));
            }
        }

        let id = match found {
            Some(id) => id,
            None => self.create_entry(
                descriptor.address,
                descriptor.width_to_create,
                descriptor.height_to_create,
                &clock,
            )?,
        };
        self.stats.misses += 1;

        let Self {
            arena,
            converters,
            dumper,
            options,
            stats,
            ..
        } = self;
        let Some(entry) = arena.get_mut(id) else {
            return Err(TextureError::StaleHandle);
        };
        entry.descriptor = *descriptor;
        entry.crc = crc;
        entry.pal_crc = pal_crc;
        entry.external_checked = false;
        entry.max_ci = max_ci;
        entry.needs_reload = false;

        let Some(texture) = entry.texture.as_mut() else {
            return Ok(TextureRef::Entry(id));
        };
        if texture.created_width() < descriptor.width_to_create {
            entry.descriptor.width_to_load = texture.created_width();
        }
        if texture.created_height() < descriptor.height_to_create {
            entry.descriptor.height_to_load = texture.created_height();
        }
        entry.enhancement = Default::default();
        entry.enhanced = None;

        let loaded = match texture.lock() {
            None => {
                tracing::warn!(address = descriptor.address, "unable to lock texture for loading");
                Ok(())
            }
            Some(mut surface) => match target {
                Some((index, info)) => {
                    tracing::trace!(address = descriptor.address, index, "loading texture from render target");
                    ctx.render_targets
                        .load_into(index, &mut surface, &entry.descriptor)
                        .map(|()| match info.format {
                            TextureFormat::I => rgba_to_intensity(&mut surface, false),
                            TextureFormat::Ia => rgba_to_intensity(&mut surface, true),
                            _ => {}
                        })
                        .map_err(TextureError::RenderTarget)
                }
                None => {
                    tracing::trace!(address = descriptor.address, "loading new texture from memory");
                    match converters.select(&entry.descriptor, from_tmem, options.allow_tmem, ctx.tile) {
                        Some(convert) => convert(&mut surface, &entry.descriptor, ctx.memory)
                            .map_err(TextureError::Decode),
                        None => {
                            tracing::warn!(
                                "unable to decompress {}/{}bpp",
                                descriptor.format,
                                descriptor.size.bits()
                            );
                            stats.missing_converters += 1;
                            Ok(())
                        }
                    }
                }
            },
        };

        entry.descriptor.width_to_load = descriptor.width_to_load;
        entry.descriptor.height_to_load = descriptor.height_to_load;

        if let Err(err) = loaded {
            tracing::warn!(address = descriptor.address, error = %err, "texture decompression failed");
            entry.needs_reload = true;
            stats.decode_failures += 1;
            return Err(err);
        }

        if auto_extend {
            expand_texture(texture, &entry.descriptor);
        }

        if let (Some(dumper), None) = (dumper.as_mut(), target) {
            if let Some(surface) = texture.lock() {
                if let Err(err) = dumper.dump(&entry.descriptor, crc, &surface) {
                    tracing::warn!(address = descriptor.address, error = %err, "failed to dump texture");
                }
            }
        }

        Ok(TextureRef::Entry(id))
    }

    fn redirect(
        &mut self,
        index: usize,
        descriptor: &TextureDescriptor,
        ctx: &mut FrameContext<'_>,
    ) -> TextureRef {
        ctx.render_targets.redirect(index, descriptor);
        self.stats.redirects += 1;
        tracing::trace!(address = descriptor.address, index, "texture redirected to render target");
        TextureRef::RenderTarget(index)
    }

    /// Revives a pooled entry created at exactly this size, or allocates a new one, and indexes it.
    fn create_entry(
        &mut self,
        address: u32,
        width: u32,
        height: u32,
        clock: &FrameClock,
    ) -> Result<EntryId, TextureError> {
        let id = match self.pool.revive(&mut self.arena, width, height) {
            Some(id) => {
                self.stats.revived += 1;
                id
            }
            None => {
                let Some(texture) = self.allocator.allocate(width, height) else {
                    tracing::warn!(width, height, "unable to create texture");
                    return Err(TextureError::Allocation { width, height });
                };
                self.stats.allocated += 1;
                self.arena
                    .insert(CacheEntry::new(texture, width, height), Residency::Indexed)
            }
        };
        if let Some(entry) = self.arena.get_mut(id) {
            entry.reset(address, clock);
        }
        self.index.insert(&mut self.arena, id);
        Ok(id)
    }

    /// Moves an indexed entry to the recycle pool. Returns `false` if it was not indexed.
    pub fn remove_texture(&mut self, id: EntryId) -> bool {
        if !self.index.unlink(&mut self.arena, id) {
            return false;
        }
        self.recycle(id);
        true
    }

    fn recycle(&mut self, id: EntryId) {
        if self.pool.recycle(&mut self.arena, id) {
            self.stats.destroyed += 1;
        } else {
            self.stats.recycled += 1;
        }
    }

    /// Evicts indexed entries idle for longer than the kill threshold and
    /// destroys pooled entries idle for longer than the delete threshold.
    /// Bound entries are never touched.
    pub fn purge_old_textures(&mut self, clock: &FrameClock, liveness: &dyn Liveness) -> PurgeReport {
        if !self.index.is_initialized() {
            return PurgeReport::default();
        }
        let mut report = PurgeReport::default();
        for id in self.index.ids(&self.arena) {
            let kill_after = self.options.frames_to_kill;
            let idle = self
                .arena
                .get(id)
                .is_some_and(|entry| clock.frames_since(entry.frame_last_used) > kill_after);
            if idle && !liveness.is_bound(id) && self.remove_texture(id) {
                report.evicted += 1;
            }
        }
        report.destroyed =
            self.pool
                .purge_idle(&mut self.arena, clock, self.options.frames_to_delete, liveness);
        self.stats.destroyed += report.destroyed as u64;
        if report.evicted > 0 || report.destroyed > 0 {
            tracing::debug!(
                evicted = report.evicted,
                destroyed = report.destroyed,
                pooled = self.pool.len(),
                "purged idle textures"
            );
        }
        report
    }

    /// Moves every indexed entry to the recycle pool.
    pub fn recycle_all(&mut self) {
        for bucket in 0..self.index.bucket_count() {
            while let Some(id) = self.index.pop_front(&mut self.arena, bucket) {
                self.recycle(id);
            }
        }
    }

    /// Forces every indexed entry to look for an external replacement again.
    pub fn recheck_external_textures(&mut self) {
        for id in self.index.ids(&self.arena) {
            if let Some(entry) = self.arena.get_mut(id) {
                entry.external_checked = false;
            }
        }
    }

    /// Releases every texture. The manager rejects fetches afterwards.
    pub fn shutdown(&mut self) {
        if !self.index.is_initialized() {
            return;
        }
        self.recycle_all();
        let destroyed = self.pool.destroy_all(&mut self.arena);
        self.stats.destroyed += destroyed as u64;
        self.index.teardown();
        tracing::debug!(destroyed, "texture cache shut down");
    }

    /// The `n`th indexed entry in bucket order. Requires diagnostics.
    pub fn cached_texture(&self, n: usize) -> Option<(EntryId, &CacheEntry<A::Texture>)> {
        if !self.options.diagnostics {
            return None;
        }
        let id = self.index.ids(&self.arena).into_iter().nth(n)?;
        self.arena.get(id).map(|entry| (id, entry))
    }

    /// Number of indexed entries. Requires diagnostics.
    pub fn cached_texture_count(&self) -> Option<usize> {
        if !self.options.diagnostics {
            return None;
        }
        let count = self.index.ids(&self.arena).len();
        tracing::debug!(count, "cached textures");
        Some(count)
    }
}

impl<A: TextureAllocator> Drop for TextureManager<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
