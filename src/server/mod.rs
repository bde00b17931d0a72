//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /tiles/{z}/{x}/{y}.{format}      GET /tiles.json          │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │  tilejson   │  │        routes           │  │
//! │  │ (requests)  │  │ (descriptor)│  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod tilejson;

pub use handlers::{
    health_handler, tile_handler, tilejson_handler, AppState, ErrorResponse, HandlerError,
    HealthResponse, TilePathParams,
};
pub use routes::{create_router, create_router_with_shared_service, RouterConfig};
pub use tilejson::{describe, request_origin, TileJson, DEFAULT_TILESET_NAME, TILEJSON_VERSION};
