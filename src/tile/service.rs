//! Tile Service for orchestrating vector tile generation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Validate z/x/y/format   4. Query each layer         │    │
//! │  │  2. Read current TTL        5. Concatenate buffers      │    │
//! │  │  3. Check cache             6. Cache & return           │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │ TileCache │      │   Envelope   │    │  SpatialStore    │  │
//! │    └───────────┘      └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{StoreError, TileError};
use crate::mvt::{concat_layers, empty_layer};
use crate::settings::{TtlSource, DEFAULT_CACHE_TTL_SECS};
use crate::store::{layers, LayerQuery, SpatialStore, LAYERS};

use super::cache::{TileCache, TileCacheKey, DEFAULT_TILE_CACHE_CAPACITY};
use super::coord::{TileCoord, TileFormat, DEFAULT_MAX_ZOOM};
use super::envelope::Envelope;

/// Default deadline for a single layer query.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Tile Request
// =============================================================================

/// A request for a tile, as it arrived in the URL.
///
/// Values are kept as text so that non-numeric input is rejected by the
/// same validation step as out-of-range input.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub z: String,
    pub x: String,
    pub y: String,
    /// File extension, without the dot
    pub format: String,
}

impl TileRequest {
    pub fn new(
        z: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            z: z.into(),
            x: x.into(),
            y: y.into(),
            format: format.into(),
        }
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// Concatenated layer buffers
    pub data: Bytes,

    /// Whether this tile was served from cache
    pub cache_hit: bool,

    /// Cache TTL in effect for this request
    pub ttl: Duration,

    pub format: TileFormat,
}

/// Snapshot of tile cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size: usize,
    pub capacity: usize,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for generating and caching vector tiles.
///
/// # Example
///
/// ```ignore
/// use mmt_tiles::store::MemoryStore;
/// use mmt_tiles::tile::{TileRequest, TileService};
///
/// let service = TileService::new(MemoryStore::new()).with_max_zoom(18);
/// let response = service.get_tile(&TileRequest::new("5", "10", "10", "pbf")).await?;
///
/// println!("Tile size: {} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct TileService<S: SpatialStore> {
    store: Arc<S>,

    /// Cache for assembled tiles
    cache: TileCache,

    /// Consulted on every request
    ttl: Arc<dyn TtlSource>,

    max_zoom: u8,

    store_timeout: Duration,
}

impl<S: SpatialStore> TileService<S> {
    /// Create a new tile service with default settings.
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    /// Create a new tile service with a shared store.
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            cache: TileCache::with_capacity(DEFAULT_TILE_CACHE_CAPACITY),
            ttl: Arc::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            max_zoom: DEFAULT_MAX_ZOOM,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Replace the tile cache with one of the given byte capacity.
    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache = TileCache::with_capacity(cache_capacity);
        self
    }

    /// Read the cache TTL from `ttl` on every request.
    pub fn with_ttl_source(mut self, ttl: impl TtlSource + 'static) -> Self {
        self.ttl = Arc::new(ttl);
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Validate a raw request and serve the tile.
    ///
    /// Invalid coordinates and formats are rejected before the cache or the
    /// store is touched.
    pub async fn get_tile(&self, request: &TileRequest) -> Result<TileResponse, TileError> {
        let coord = TileCoord::parse(
            &request.z,
            &request.x,
            &request.y,
            &request.format,
            self.max_zoom,
        )?;
        self.get_tile_at(coord).await
    }

    /// Serve a validated tile, using the cache when available.
    pub async fn get_tile_at(&self, coord: TileCoord) -> Result<TileResponse, TileError> {
        let ttl = self.ttl.cache_ttl();
        let key = TileCacheKey::from(&coord);

        let (data, cache_hit) = self
            .cache
            .get_or_compute(key, ttl, || self.render_tile(&coord))
            .await?;

        debug!(
            z = coord.z(),
            x = coord.x(),
            y = coord.y(),
            cache_hit,
            bytes = data.len(),
            "Tile served"
        );

        Ok(TileResponse {
            data,
            cache_hit,
            ttl,
            format: coord.format(),
        })
    }

    /// Build a tile without consulting or filling the cache.
    ///
    /// Runs one store query per layer in registry order and concatenates the
    /// buffers. A layer with no matching rows contributes an empty layer, so
    /// the tile always contains every layer.
    pub async fn render_tile(&self, coord: &TileCoord) -> Result<Bytes, TileError> {
        let envelope = Envelope::from_tile(coord);

        let mut buffers = Vec::with_capacity(LAYERS.len());
        for layer in layers() {
            let query = LayerQuery::new(layer, &envelope);
            let data = self.query_layer(&query).await?;
            if data.is_empty() {
                buffers.push(empty_layer(layer.name()));
            } else {
                buffers.push(data);
            }
        }

        Ok(concat_layers(buffers))
    }

    async fn query_layer(&self, query: &LayerQuery) -> Result<Bytes, TileError> {
        match tokio::time::timeout(self.store_timeout, self.store.layer_tile(query)).await {
            Ok(result) => result,
            Err(_) => {
                let layer = query.layer().name();
                let after_ms = u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(layer, after_ms, "Layer query timed out");
                Err(StoreError::Timeout { layer, after_ms }.into())
            }
        }
    }

    /// Get tile cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len().await,
            size: self.cache.size().await,
            capacity: self.cache.capacity(),
        }
    }

    /// Clear the tile cache.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

// =============================================================================
// Tests
// =============================================================================
