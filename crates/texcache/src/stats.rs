use serde::Serialize;

/// Running counters kept by the texture manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests served from an entry whose checksums still matched.
    pub hits: u64,
    /// Requests that had to convert pixels.
    pub misses: u64,
    /// Requests answered by a render target.
    pub redirects: u64,
    pub revived: u64,
    pub allocated: u64,
    /// Entries moved from the index to the recycle pool.
    pub recycled: u64,
    /// Entries whose resources were released.
    pub destroyed: u64,
    pub decode_failures: u64,
    pub missing_converters: u64,
}

impl CacheStats {
    pub fn requests(&self) -> u64 {
        self.hits + self.misses + self.redirects
    }

    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => (self.hits + self.redirects) as f64 / total as f64,
        }
    }
}
