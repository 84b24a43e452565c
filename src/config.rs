//! Cache configuration.
//!
//! Supplied by the embedding server's config loader in production; the
//! maintenance binary builds it from environment variables:
//!
//! - `GALCACHE_DATA_PATH` — base data directory; the cache root is its
//!   `cache` subdirectory
//! - `GALCACHE_TTL` — idle time-to-live, e.g. `336h`, `90m`, `1h30m`
//!   (default 336h / 14 days, clamped to a minimum of 15 minutes)
//! - `GALCACHE_SIZE` — maximum cache size in MiB (default 20000, minimum
//!   100); carried in configuration but enforced by no eviction path yet

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::CacheError;

const DEFAULT_TTL: Duration = Duration::from_secs(336 * 60 * 60);
const MIN_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SIZE_MIB: u64 = 20_000;
const MIN_SIZE_MIB: u64 = 100;
const DEFAULT_JANITOR_PERIOD: Duration = Duration::from_secs(60);

/// Configuration consumed by the gallery cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Base data directory; the cache lives in its `cache` subdirectory.
    pub data_path: PathBuf,
    /// Maximum idle duration before a cache directory may be evicted.
    pub ttl: Duration,
    /// Reserved: maximum cache size in MiB. No eviction path enforces this
    /// yet; the option is parsed and clamped so deployments can set it ahead
    /// of size-based eviction landing.
    pub max_size_mib: u64,
    /// How often the eviction janitor wakes up.
    pub janitor_period: Duration,
}

impl CacheConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ttl: DEFAULT_TTL,
            max_size_mib: DEFAULT_SIZE_MIB,
            janitor_period: DEFAULT_JANITOR_PERIOD,
        }
    }

    /// Build configuration from `GALCACHE_*` environment variables.
    pub fn from_env() -> Self {
        let data_path = std::env::var("GALCACHE_DATA_PATH").unwrap_or_else(|_| "data".to_string());
        let mut config = Self::new(data_path);

        if let Ok(raw) = std::env::var("GALCACHE_TTL") {
            config.ttl = match parse_duration(&raw) {
                Some(ttl) if ttl < MIN_TTL => {
                    warn!("minimum cache TTL is 15 minutes, clamping");
                    MIN_TTL
                }
                Some(ttl) => ttl,
                None => {
                    warn!(value = %raw, "invalid GALCACHE_TTL, defaulting to 336h");
                    DEFAULT_TTL
                }
            };
        }

        if let Ok(raw) = std::env::var("GALCACHE_SIZE") {
            config.max_size_mib = match raw.parse::<u64>() {
                Ok(size) if size < MIN_SIZE_MIB => {
                    warn!("minimum cache size is 100 MiB, clamping");
                    MIN_SIZE_MIB
                }
                Ok(size) => size,
                Err(_) => {
                    warn!(value = %raw, "invalid GALCACHE_SIZE, defaulting to 20000 MiB");
                    DEFAULT_SIZE_MIB
                }
            };
        }

        config
    }

    /// The physical cache root: `<data_path>/cache`.
    pub fn cache_root(&self) -> PathBuf {
        self.data_path.join("cache")
    }

    /// Create the cache root if it does not exist.
    ///
    /// This is the one unrecoverable startup condition in the subsystem:
    /// without a cache root nothing else can run.
    pub fn init_cache_dir(&self) -> Result<(), CacheError> {
        let root = self.cache_root();
        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(root, e))
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(data_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let mut config = Self::new(data_path);
        config.ttl = ttl;
        config
    }
}

/// Parse a Go-style duration string: one or more `<number><unit>` segments
/// with units `h`, `m`, `s`, e.g. `336h`, `90m`, `1h30m`.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total += Duration::from_secs(value * unit);
    }

    // Trailing digits without a unit are malformed.
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}
