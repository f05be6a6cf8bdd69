//! Typed configuration for the texture cache.
//!
//! The cache is tuned from a small TOML document. Idle thresholds are written
//! as durations (`"5s"`, `30`, `"1m 30s"`) and converted to display-list frames
//! through `cache.frame_rate`, so a 30 fps title with the defaults moves idle
//! textures to the recycle pool after 150 frames and destroys pooled textures
//! after 900 frames.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Bucket count used by the cache index unless configured otherwise.
pub const DEFAULT_BUCKETS: usize = 809;
/// Display lists per second assumed when converting durations to frames.
pub const DEFAULT_FRAME_RATE: u32 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    pub version: u32,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub frame_buffer: FrameBufferOptions,
    #[serde(default)]
    pub loading: LoadingOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_buckets")]
    pub buckets: usize,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_kill_after", deserialize_with = "deserialize_duration")]
    pub kill_after: Duration,
    #[serde(
        default = "default_delete_after",
        deserialize_with = "deserialize_duration"
    )]
    pub delete_after: Duration,
    #[serde(default)]
    pub diagnostics: bool,
}

/// Controls how texture fetches interact with tracked render targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FrameBufferOptions {
    #[serde(default)]
    pub check_render_textures: bool,
    #[serde(default)]
    pub check_back_buffers: bool,
    #[serde(default)]
    pub write_back_buffer_to_rdram: bool,
}

impl FrameBufferOptions {
    /// Render targets are only consulted when their content is not mirrored back to memory.
    pub fn probes_render_targets(&self) -> bool {
        (self.check_render_textures || self.check_back_buffers) && !self.write_back_buffer_to_rdram
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadingOptions {
    #[serde(default = "default_allow_tmem")]
    pub allow_tmem: bool,
    #[serde(default)]
    pub dump_textures: bool,
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            buckets: default_buckets(),
            frame_rate: default_frame_rate(),
            kill_after: default_kill_after(),
            delete_after: default_delete_after(),
            diagnostics: false,
        }
    }
}

impl Default for LoadingOptions {
    fn default() -> Self {
        Self {
            allow_tmem: default_allow_tmem(),
            dump_textures: false,
            dump_dir: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: 1,
            cache: CacheSection::default(),
            frame_buffer: FrameBufferOptions::default(),
            loading: LoadingOptions::default(),
        }
    }
}

fn default_buckets() -> usize {
    DEFAULT_BUCKETS
}

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

fn default_kill_after() -> Duration {
    Duration::from_secs(5)
}

fn default_delete_after() -> Duration {
    Duration::from_secs(30)
}

fn default_allow_tmem() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl CacheSection {
    /// Frames an indexed entry may sit unused before it is moved to the recycle pool.
    pub fn frames_to_kill(&self) -> u32 {
        duration_to_frames(self.kill_after, self.frame_rate)
    }

    /// Frames a pooled entry may sit unused before its resource is destroyed.
    pub fn frames_to_delete(&self) -> u32 {
        duration_to_frames(self.delete_after, self.frame_rate)
    }
}

fn duration_to_frames(duration: Duration, frame_rate: u32) -> u32 {
    let frames = (duration.as_secs_f64() * f64::from(frame_rate)).round();
    if frames >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        frames as u32
    }
}

impl CacheConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CacheConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.cache.buckets == 0 {
            return Err(ConfigError::Invalid(
                "cache.buckets must be greater than zero".into(),
            ));
        }

        if self.cache.frame_rate == 0 {
            return Err(ConfigError::Invalid(
                "cache.frame_rate must be greater than zero".into(),
            ));
        }

        if self.cache.delete_after < self.cache.kill_after {
            return Err(ConfigError::Invalid(format!(
                "cache.delete_after ({}) must not be shorter than cache.kill_after ({})",
                humantime::format_duration(self.cache.delete_after),
                humantime::format_duration(self.cache.kill_after)
            )));
        }

        if self.loading.dump_textures && self.loading.dump_dir.is_none() {
            return Err(ConfigError::Invalid(
                "loading.dump_textures requires loading.dump_dir".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[cache]
buckets = 1021
frame_rate = 60
kill_after = "2s"
delete_after = 10
diagnostics = true

[frame_buffer]
check_render_textures = true

[loading]
allow_tmem = false
dump_textures = true
dump_dir = "/tmp/dumps"
"#;

    #[test]
    fn parses_sample_config() {
        let config = CacheConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.cache.buckets, 1021);
        assert_eq!(config.cache.frames_to_kill(), 120);
        assert_eq!(config.cache.frames_to_delete(), 600);
        assert!(config.cache.diagnostics);
        assert!(config.frame_buffer.check_render_textures);
        assert!(config.frame_buffer.probes_render_targets());
        assert!(!config.loading.allow_tmem);
        assert_eq!(config.loading.dump_dir, Some(PathBuf::from("/tmp/dumps")));
    }

    #[test]
    fn defaults_match_stock_thresholds() {
        let config = CacheConfig::from_toml_str("version = 1").expect("parse config");
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.cache.buckets, 809);
        assert_eq!(config.cache.frames_to_kill(), 150);
        assert_eq!(config.cache.frames_to_delete(), 900);
        assert!(config.loading.allow_tmem);
        assert!(!config.frame_buffer.probes_render_targets());
    }

    #[test]
    fn write_back_disables_render_target_probe() {
        let options = FrameBufferOptions {
            check_render_textures: true,
            check_back_buffers: true,
            write_back_buffer_to_rdram: true,
        };
        assert!(!options.probes_render_targets());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = CacheConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_buckets() {
        let err = CacheConfig::from_toml_str(
            r#"
version = 1

[cache]
buckets = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_delete_before_kill() {
        let err = CacheConfig::from_toml_str(
            r#"
version = 1

[cache]
kill_after = "10s"
delete_after = "5s"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_dump_without_directory() {
        let err = CacheConfig::from_toml_str(
            r#"
version = 1

[loading]
dump_textures = true
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_duration() {
        let err = CacheConfig::from_toml_str(
            r#"
version = 1

[cache]
kill_after = "soon"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reports_missing_file() {
        let err = CacheConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
