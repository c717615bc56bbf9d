//! Transformed-result cache.
//!
//! A keyed byte store sitting around the transform pipeline only. Keys are
//! built *after* sanitization (identifier plus the resolved target
//! dimensions, crop, and quality) so equivalent requests (an explicit
//! width/height equal to the defaults, say) collapse to one entry.
//!
//! Expiration slides: a hit re-arms the entry's TTL in full. Entries expire
//! passively on the next read; there is no invalidation API and no eviction
//! beyond expiry. The cache is optional: retrieval behaves identically
//! without one, only slower. Concurrent duplicate computation of the
//! same key is wasted work, not a correctness hazard, so last write wins.

use crate::transform::CropBox;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Which pipeline produced the bytes. Part of the key: a thumbnail at
/// 200x200 is not the 200x200 exact resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedOp {
    Tif,
    Jpg,
    Thumb,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identifier: String,
    pub operation: CachedOp,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<CropBox>,
    pub quality: u8,
}

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Sliding-TTL keyed byte store.
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a cached payload. A hit re-arms the entry's TTL in full; an
    /// expired entry is dropped and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            if entry.expires_at > now {
                entry.expires_at = now + self.ttl;
                debug!(identifier = %key.identifier, "cache hit, TTL re-armed");
                return Some(entry.bytes.clone());
            }
        }
        entries.remove(key);
        None
    }

    /// Store a payload under `key` with a fresh TTL. Replaces any previous
    /// entry.
    pub fn put(&self, key: CacheKey, bytes: Vec<u8>) {
        let entry = Entry {
            bytes,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().insert(key, entry);
    }
}
