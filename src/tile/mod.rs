//! Vector tile pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ TileRequest (raw z/x/y/format)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  TileCoord   │  │   TileCache     │  │
//! │  │  (validate)  │  │  (TTL + LRU)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────┐                       │
//! │  │  Envelope    │                       │
//! │  │  (EPSG:3857) │                       │
//! │  └──────────────┘                       │
//! └────────────────────┬────────────────────┘
//!                      │ LayerQuery × 3
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             SpatialStore                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileCoord`]: validated tile address (zoom range, grid bounds, format)
//! - [`Envelope`]: Web Mercator bounds of a tile and its densification step
//! - [`TileCache`]: TTL-aware LRU cache with size-based eviction
//! - [`TileService`]: runs the pipeline and fills the cache
//!
//! # Example
//!
//! ```
//! use mmt_tiles::tile::{is_valid, tile_to_envelope, WORLD_MERC_MAX};
//!
//! assert!(is_valid(10, 1023, 1023, 22));
//! assert!(!is_valid(10, 1024, 2000, 22));
//!
//! let world = tile_to_envelope(0, 0, 0);
//! assert_eq!(world.xmax, WORLD_MERC_MAX);
//! assert_eq!(world.seg_size, world.width() / 4.0);
//! ```

mod cache;
mod coord;
mod envelope;
mod service;

pub use cache::{TileCache, TileCacheKey, DEFAULT_TILE_CACHE_CAPACITY};
pub use coord::{is_valid, TileCoord, TileFormat, DEFAULT_MAX_ZOOM, MAX_SUPPORTED_ZOOM};
pub use envelope::{
    tile_to_envelope, webmercator_to_wgs84, wgs84_to_webmercator, Envelope, DENSIFY_FACTOR,
    WORLD_MERC_MAX, WORLD_MERC_MIN,
};
pub use service::{CacheStats, TileRequest, TileResponse, TileService, DEFAULT_STORE_TIMEOUT};
