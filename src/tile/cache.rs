//! Tile cache for encoded vector tiles.
//!
//! Entries expire after the TTL in effect when they were stored. Expired
//! entries are treated as absent and dropped when next looked up; nothing
//! purges them in the background.
//!
//! # Cache Key
//!
//! Tiles are cached by `(z, x, y, format)`.
//!
//! # Size-Based Eviction
//!
//! The cache tracks the total size of cached tiles in bytes and evicts
//! least-recently-used entries when the capacity is exceeded.
//!
//! # Concurrency
//!
//! Concurrent misses for the same key each compute the tile and the last
//! write wins. The pipeline is deterministic, so both writes carry the same
//! payload.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::coord::{TileCoord, TileFormat};

/// Default cache capacity: 100MB
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 100 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for encoded tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCacheKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub format: TileFormat,
}

impl TileCacheKey {
    pub fn new(z: u8, x: u32, y: u32, format: TileFormat) -> Self {
        Self { z, x, y, format }
    }
}

impl From<&TileCoord> for TileCacheKey {
    fn from(coord: &TileCoord) -> Self {
        Self::new(coord.z(), coord.x(), coord.y(), coord.format())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Bytes,
    /// `None` when the TTL reaches past what the clock can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

// =============================================================================
// Tile Cache
// =============================================================================

/// TTL-aware LRU cache for encoded tiles with size-based capacity.
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
///
/// # Example
///
/// ```
/// use mmt_tiles::tile::{TileCache, TileCacheKey, TileFormat};
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TileCache::new();
///     let key = TileCacheKey::new(3, 1, 2, TileFormat::Pbf);
///
///     let (tile, hit) = cache
///         .get_or_compute(key, Duration::from_secs(60), || async {
///             Ok::<_, std::convert::Infallible>(Bytes::from_static(b"\x1a\x00"))
///         })
///         .await
///         .unwrap();
///     assert!(!hit);
///     assert_eq!(cache.get(&key).await, Some(tile));
/// }
/// ```
pub struct TileCache {
    /// The underlying LRU cache
    cache: RwLock<LruCache<TileCacheKey, CacheEntry>>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Current total size in bytes
    current_size: RwLock<usize>,
}

impl TileCache {
    /// Create a new tile cache with default capacity (100MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Create a new tile cache with the specified capacity in bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new tile cache with specified capacity and maximum entries.
    ///
    /// A zero entry count is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(max_entries)),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get an unexpired tile from the cache.
    ///
    /// A hit marks the entry as recently used. An expired entry is removed
    /// and reported as a miss.
    pub async fn get(&self, key: &TileCacheKey) -> Option<Bytes> {
        let now = Instant::now();
        let mut cache = self.cache.write().await;

        match cache.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.payload.clone()),
            Some(_) => {}
            None => return None,
        }

        if let Some(expired) = cache.pop(key) {
            let mut current_size = self.current_size.write().await;
            *current_size = current_size.saturating_sub(expired.payload.len());
        }
        None
    }

    /// Check for an unexpired tile without updating LRU order.
    pub async fn contains(&self, key: &TileCacheKey) -> bool {
        let cache = self.cache.read().await;
        cache
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Store a tile that expires after `ttl`.
    ///
    /// A zero TTL stores nothing. If the cache is over capacity after
    /// insertion, least-recently-used entries are evicted until it fits.
    pub async fn put(&self, key: TileCacheKey, data: Bytes, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let data_size = data.len();
        let entry = CacheEntry {
            payload: data,
            expires_at: Instant::now().checked_add(ttl),
        };

        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        // If key exists, subtract old size first
        if let Some(old) = cache.peek(&key) {
            *current_size = current_size.saturating_sub(old.payload.len());
        }

        // Entry-count eviction by the LRU itself must be accounted for too
        if let Some((evicted_key, evicted)) = cache.push(key, entry) {
            if evicted_key != key {
                *current_size = current_size.saturating_sub(evicted.payload.len());
            }
        }
        *current_size += data_size;

        while *current_size > self.max_size {
            if let Some((_, evicted)) = cache.pop_lru() {
                *current_size = current_size.saturating_sub(evicted.payload.len());
            } else {
                break;
            }
        }
    }

    /// Return the cached tile, or compute, store and return it.
    ///
    /// The boolean is `true` for a cache hit. With a zero TTL the cache is
    /// bypassed entirely and `compute` runs on every call. Errors from
    /// `compute` are returned as-is and nothing is stored.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: TileCacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<(Bytes, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, E>>,
    {
        if ttl.is_zero() {
            return compute().await.map(|data| (data, false));
        }

        if let Some(data) = self.get(&key).await {
            return Ok((data, true));
        }

        let data = compute().await?;
        self.put(key, data.clone(), ttl).await;
        Ok((data, false))
    }

    /// Remove a tile from the cache.
    pub async fn remove(&self, key: &TileCacheKey) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        let entry = cache.pop(key)?;
        *current_size = current_size.saturating_sub(entry.payload.len());
        Some(entry.payload)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }

    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.read().await;
        cache.is_empty()
    }

    /// Get the current total size of cached tiles in bytes.
    pub async fn size(&self) -> usize {
        let current_size = self.current_size.read().await;
        *current_size
    }

    /// Get the maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
