//! Router configuration for the vector tile server.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check
//! /tiles.json                      - TileJSON descriptor
//! /tiles/{z}/{x}/{y}.{format}      - Tile endpoint
//! ```
//!
//! All routes are public: tiles are meant for anonymous embedding by
//! third-party map clients, so every response (errors included) allows any
//! origin.
//!
//! # Example
//!
//! ```ignore
//! use mmt_tiles::server::{create_router, RouterConfig};
//! use mmt_tiles::store::MemoryStore;
//! use mmt_tiles::tile::TileService;
//!
//! let tile_service = TileService::new(MemoryStore::new());
//! let router = create_router(tile_service, RouterConfig::new().with_tracing(false));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, tile_handler, tilejson_handler, AppState};
use super::tilejson::DEFAULT_TILESET_NAME;
use crate::store::SpatialStore;
use crate::tile::TileService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Display name reported by `/tiles.json`
    pub tileset_name: String,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Whether `X-Forwarded-Proto`/`X-Forwarded-Host` name the public origin
    pub trust_forwarded_headers: bool,
}

impl RouterConfig {
    /// Default name, tracing enabled, forwarded headers ignored.
    pub fn new() -> Self {
        Self {
            tileset_name: DEFAULT_TILESET_NAME.to_string(),
            enable_tracing: true,
            trust_forwarded_headers: false,
        }
    }

    pub fn with_tileset_name(mut self, name: impl Into<String>) -> Self {
        self.tileset_name = name.into();
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Trust proxy headers when building the TileJSON URL template.
    pub fn with_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router<S>(tile_service: TileService<S>, config: RouterConfig) -> Router
where
    S: SpatialStore + 'static,
{
    create_router_with_shared_service(Arc::new(tile_service), config)
}

/// Create the router around a service the caller keeps a handle to.
pub fn create_router_with_shared_service<S>(
    tile_service: Arc<TileService<S>>,
    config: RouterConfig,
) -> Router
where
    S: SpatialStore + 'static,
{
    let app_state = AppState::with_shared_service(tile_service)
        .with_tileset_name(config.tileset_name)
        .with_forwarded_headers(config.trust_forwarded_headers);

    // {filename} captures "{y}.{format}"
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/tiles.json", get(tilejson_handler::<S>))
        .route("/tiles/{z}/{x}/{filename}", get(tile_handler::<S>))
        .layer(build_cors_layer())
        .with_state(app_state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer: any origin, read-only methods.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_origin(Any)
}

// =============================================================================
// Tests
// =============================================================================
