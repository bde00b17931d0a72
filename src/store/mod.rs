//! Spatial store abstraction.
//!
//! The tile service asks a [`SpatialStore`] for one encoded layer per
//! registry entry. Two implementations exist:
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │         TileService          │
//!            └──────────────┬───────────────┘
//!                           │ LayerQuery (layer + envelope)
//!                           ▼
//!            ┌──────────────────────────────┐
//!            │     SpatialStore trait       │
//!            └──────────────┬───────────────┘
//!                ┌──────────┴───────────┐
//!                ▼                      ▼
//!      ┌──────────────────┐   ┌────────────────────┐
//!      │  PostgisStore    │   │    MemoryStore     │
//!      │ (ST_AsMVT in SQL)│   │ (geo clip + mvt)   │
//!      └──────────────────┘   └────────────────────┘
//! ```
//!
//! `PostgisStore` lets the database clip and encode the layer. `MemoryStore`
//! performs the same selection, clipping and encoding in process and backs
//! the tests and local development.

mod layer;
mod memory;
mod postgis;
mod query;

pub use layer::{layers, Layer, LayerSpec, LAYERS};
pub use memory::MemoryStore;
pub use postgis::{PostgisStore, PostgisStoreConfig};
pub use query::LayerQuery;

use async_trait::async_trait;
use bytes::Bytes;
use geo::Geometry;

use crate::error::TileError;

// =============================================================================
// SpatialStore Trait
// =============================================================================

/// A queryable source of published feature geometries.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Produce the encoded layer buffer for one layer of one tile.
    ///
    /// An empty buffer means no feature matched; the caller substitutes an
    /// empty layer.
    async fn layer_tile(&self, query: &LayerQuery) -> Result<Bytes, TileError>;
}

// =============================================================================
// Feature
// =============================================================================

/// One feature row as stored: attributes plus a WGS84 (EPSG:4326) geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: i64,
    pub name: String,
    pub weight: i64,
    pub theme_id: Option<i64>,
    pub tag_str: String,
    pub geom: Geometry<f64>,
    /// Unpublished rows are never tiled
    pub published: bool,
}

impl Feature {
    /// A published feature with default attributes.
    pub fn new(id: i64, geom: impl Into<Geometry<f64>>) -> Self {
        Self {
            id,
            name: String::new(),
            weight: 0,
            theme_id: None,
            tag_str: String::new(),
            geom: geom.into(),
            published: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_theme(mut self, theme_id: i64) -> Self {
        self.theme_id = Some(theme_id);
        self
    }

    pub fn with_tags(mut self, tag_str: impl Into<String>) -> Self {
        self.tag_str = tag_str.into();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }
}
