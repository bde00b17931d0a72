//! Vector tile layer encoding.
//!
//! Packs clipped features of one layer into a protobuf-encoded tile holding
//! exactly that layer. Because a tile is a repeated `layers` field, several
//! such buffers concatenated byte-wise decode as one multi-layer tile, which
//! is how the per-layer buffers are assembled into a response.

mod geometry;

pub use geometry::{ring_area, TileGeometry, TilePoint};

use bytes::{Bytes, BytesMut};
use geozero::mvt::{tile, Message as _, TagsBuilder, Tile, TileValue};

use crate::error::EncodeError;

/// Tile-local grid size used for all layers.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Layer format version written into every layer.
const MVT_VERSION: u32 = 2;

/// A feature clipped to the tile and converted to tile-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedFeature {
    /// Store row id, written as the feature id when non-negative
    pub id: i64,
    /// Attribute name/value pairs, in column order
    pub properties: Vec<(String, TileValue)>,
    pub geometry: TileGeometry,
}

/// Incrementally builds one layer.
pub struct LayerBuilder {
    name: String,
    extent: u32,
    tags: TagsBuilder<String>,
    features: Vec<tile::Feature>,
}

impl LayerBuilder {
    pub fn new(name: impl Into<String>, extent: u32) -> Self {
        Self {
            name: name.into(),
            extent,
            tags: TagsBuilder::new(),
            features: Vec::new(),
        }
    }

    /// Add a feature, rejecting geometry that cannot be encoded.
    pub fn add_feature(&mut self, feature: &ClippedFeature) -> Result<(), EncodeError> {
        feature
            .geometry
            .validate()
            .map_err(|reason| EncodeError::InvalidGeometry {
                layer: self.name.clone(),
                feature_id: feature.id,
                reason,
            })?;

        let geometry = feature
            .geometry
            .encode()
            .map_err(|e| EncodeError::InvalidGeometry {
                layer: self.name.clone(),
                feature_id: feature.id,
                reason: e.to_string(),
            })?;

        let mut tags = Vec::with_capacity(feature.properties.len() * 2);
        for (key, value) in &feature.properties {
            let (key_idx, value_idx) = self.tags.insert(key.clone(), value.clone());
            tags.push(key_idx);
            tags.push(value_idx);
        }

        self.features.push(tile::Feature {
            id: u64::try_from(feature.id).ok(),
            tags,
            r#type: Some(feature.geometry.geom_type() as i32),
            geometry,
        });
        Ok(())
    }

    pub fn build(self) -> tile::Layer {
        let (keys, values) = self.tags.into_tags();
        tile::Layer {
            version: MVT_VERSION,
            name: self.name,
            features: self.features,
            keys,
            values: values.into_iter().map(Into::into).collect(),
            extent: Some(self.extent),
        }
    }

    /// Encode the layer as a single-layer tile buffer.
    pub fn finish(self) -> Bytes {
        let tile = Tile {
            layers: vec![self.build()],
        };
        Bytes::from(tile.encode_to_vec())
    }
}

/// Encode all features of one layer.
///
/// An empty feature list yields a valid layer with no features.
pub fn encode_layer(name: &str, features: &[ClippedFeature]) -> Result<Bytes, EncodeError> {
    let mut builder = LayerBuilder::new(name, DEFAULT_EXTENT);
    for feature in features {
        builder.add_feature(feature)?;
    }
    Ok(builder.finish())
}

/// A layer buffer with no features.
pub fn empty_layer(name: &str) -> Bytes {
    LayerBuilder::new(name, DEFAULT_EXTENT).finish()
}

/// Concatenate layer buffers, in order, into one tile payload.
pub fn concat_layers<I>(buffers: I) -> Bytes
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut out = BytesMut::new();
    for buffer in buffers {
        out.extend_from_slice(buffer.as_ref());
    }
    out.freeze()
}
