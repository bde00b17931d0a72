//! # mmt-tiles
//!
//! A vector tile server for the Memory Map Toolkit feature layers.
//!
//! Points, lines and polygons stored in PostGIS are served as Mapbox Vector
//! Tiles (MVT) under the XYZ scheme, with a short-lived in-process tile cache
//! and a TileJSON descriptor for map clients.
//!
//! ## Architecture
//!
//! - [`tile`] - Coordinate validation, envelope projection, tile cache and service
//! - [`store`] - Layer registry, parameterized queries, PostGIS and in-memory stores
//! - [`mvt`] - MVT layer and geometry encoding
//! - [`settings`] - Runtime-reloadable settings (cache TTL)
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use mmt_tiles::{create_router, MemoryStore, RouterConfig, TileService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = TileService::new(MemoryStore::new());
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod mvt;
pub mod server;
pub mod settings;
pub mod store;
pub mod tile;

// Re-export commonly used types
pub use config::Config;
pub use error::{EncodeError, SettingsError, StoreError, TileError};
pub use server::{
    create_router, create_router_with_shared_service, AppState, ErrorResponse, RouterConfig,
    TileJson,
};
pub use settings::{spawn_settings_reloader, RuntimeSettings, TtlSource};
pub use store::{
    Feature, Layer, LayerQuery, MemoryStore, PostgisStore, PostgisStoreConfig, SpatialStore,
};
pub use tile::{
    is_valid, tile_to_envelope, Envelope, TileCache, TileCacheKey, TileCoord, TileFormat,
    TileRequest, TileResponse, TileService,
};
