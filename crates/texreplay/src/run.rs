use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use texcache::{
    CacheStats, FrameClock, FrameContext, NoRenderTargets, SoftwareAllocator, TextureManager,
    TextureUnits, TileState, MAX_TEXTURE_UNITS,
};
use texconfig::CacheConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::convert;
use crate::scenario::Workload;

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub frames: u32,
    pub textures: u32,
    pub seed: u64,
    pub purge_every: u32,
}

impl From<&Cli> for ReplayOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            frames: cli.frames,
            textures: cli.textures,
            seed: cli.seed,
            purge_every: cli.purge_every,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub frames: u32,
    pub textures: u32,
    pub seed: u64,
    pub rewrites: u32,
    pub failures: u32,
    pub evicted: usize,
    pub purged: usize,
    pub indexed: usize,
    pub pooled: usize,
    pub hit_rate: f64,
    pub stats: CacheStats,
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let options = ReplayOptions::from(&cli);
    tracing::info!(
        frames = options.frames,
        textures = options.textures,
        seed = options.seed,
        buckets = config.cache.buckets,
        "replaying texture workload"
    );
    let report = replay(&config, options);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        print_summary(&report);
    }
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CacheConfig> {
    match path {
        Some(path) => CacheConfig::from_file(path)
            .with_context(|| format!("failed to load cache configuration from {}", path.display())),
        None => Ok(CacheConfig::default()),
    }
}

pub fn replay(config: &CacheConfig, options: ReplayOptions) -> Report {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut workload = Workload::generate(options.textures, &mut rng);
    let mut manager =
        TextureManager::from_config(SoftwareAllocator::new(), config, convert::table());
    let mut clock = FrameClock::new();
    let mut targets = NoRenderTargets;
    let mut units = TextureUnits::new();

    let mut rewrites = 0;
    let mut failures = 0;
    let mut evicted = 0;
    let mut purged = 0;

    for frame in 0..options.frames {
        clock.advance_display_list();
        units.clear();

        let active: Vec<usize> = workload.active(frame).collect();
        if !active.is_empty() && rng.gen_ratio(1, 20) {
            let index = active[rng.gen_range(0..active.len())];
            if workload.rewrite(index, &mut rng) {
                rewrites += 1;
            }
        }

        for (slot, &index) in active.iter().enumerate() {
            clock.tick();
            let mut ctx = FrameContext {
                clock: &clock,
                memory: &workload.rdram,
                render_targets: &mut targets,
                tile: TileState::default(),
            };
            match manager.get_texture(&workload.descriptors[index], false, true, &mut ctx) {
                Ok(texture) => {
                    units.bind(slot % MAX_TEXTURE_UNITS, texture);
                }
                Err(err) => {
                    failures += 1;
                    tracing::warn!(index, error = %err, "texture unavailable");
                }
            }
        }

        if options.purge_every > 0 && (frame + 1) % options.purge_every == 0 {
            let purge = manager.purge_old_textures(&clock, &units);
            evicted += purge.evicted;
            purged += purge.destroyed;
        }
    }

    let stats = manager.stats();
    let report = Report {
        frames: options.frames,
        textures: options.textures,
        seed: options.seed,
        rewrites,
        failures,
        evicted,
        purged,
        indexed: manager.indexed_len(),
        pooled: manager.pooled_len(),
        hit_rate: stats.hit_rate(),
        stats,
    };
    manager.shutdown();
    report
}

fn print_summary(report: &Report) {
    let stats = &report.stats;
    println!(
        "Replayed {} frames over {} textures (seed {})",
        report.frames, report.textures, report.seed
    );
    println!(
        "  requests: {:<8} hits: {:<8} misses: {:<8} hit rate: {:.1}%",
        stats.requests(),
        stats.hits,
        stats.misses,
        report.hit_rate * 100.0
    );
    println!(
        "  allocated: {:<7} revived: {:<6} recycled: {:<7} destroyed: {}",
        stats.allocated, stats.revived, stats.recycled, stats.destroyed
    );
    println!(
        "  rewrites: {:<8} failures: {:<5} missing converters: {}",
        report.rewrites, report.failures, stats.missing_converters
    );
    println!(
        "  resident: {} indexed, {} pooled",
        report.indexed, report.pooled
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options(frames: u32) -> ReplayOptions {
        ReplayOptions {
            frames,
            textures: 8,
            seed: 11,
            purge_every: 30,
        }
    }

    fn short_lived() -> CacheConfig {
        let mut config = CacheConfig::default();
        config.cache.kill_after = Duration::from_secs(1);
        config.cache.delete_after = Duration::from_secs(2);
        config
    }

    #[test]
    fn replay_is_deterministic() {
        let config = CacheConfig::default();
        assert_eq!(replay(&config, options(90)), replay(&config, options(90)));
    }

    #[test]
    fn steady_frames_mostly_hit() {
        let report = replay(&CacheConfig::default(), options(50));
        assert_eq!(report.failures, 0);
        assert_eq!(report.stats.missing_converters, 0);
        assert!(report.stats.hits > report.stats.misses);
        assert_eq!(report.evicted, 0);
    }

    #[test]
    fn idle_group_is_evicted_and_revived() {
        let report = replay(&short_lived(), options(150));
        assert!(report.evicted > 0, "{report:?}");
        assert!(report.stats.revived > 0, "{report:?}");
    }

    #[test]
    fn zero_frames_is_empty() {
        let report = replay(&CacheConfig::default(), options(0));
        assert_eq!(report.stats, CacheStats::default());
        assert_eq!(report.indexed, 0);
    }
}
