//! In-process spatial store.
//!
//! Mirrors the PostGIS query in Rust: rows are filtered with the densified
//! tile bounds reprojected to WGS84, reprojected to Web Mercator, clipped to
//! the tile box and scaled into the 4096 tile grid (y axis flipped) before
//! encoding.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use geo::{
    BooleanOps, Coord, Geometry, Intersects, LineString, MapCoords, MultiLineString,
    MultiPolygon, Polygon,
};
use geozero::mvt::TileValue;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Feature, Layer, LayerQuery, SpatialStore};
use crate::error::{EncodeError, TileError};
use crate::mvt::{encode_layer, ClippedFeature, TileGeometry, TilePoint, DEFAULT_EXTENT};
use crate::tile::{webmercator_to_wgs84, wgs84_to_webmercator, Envelope};

/// Feature rows held in memory, per layer.
#[derive(Default)]
pub struct MemoryStore {
    features: RwLock<HashMap<Layer, Vec<Feature>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature row to a layer.
    pub async fn insert(&self, layer: Layer, feature: Feature) {
        let mut features = self.features.write().await;
        features.entry(layer).or_default().push(feature);
    }

    /// Number of rows stored for a layer, published or not.
    pub async fn len(&self, layer: Layer) -> usize {
        self.features
            .read()
            .await
            .get(&layer)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl SpatialStore for MemoryStore {
    async fn layer_tile(&self, query: &LayerQuery) -> Result<Bytes, TileError> {
        let layer = query.layer();
        let envelope = query.envelope();
        let bounds = bounds_wgs84(envelope);

        let features = self.features.read().await;
        let rows = features.get(&layer).map(Vec::as_slice).unwrap_or(&[]);

        let mut clipped = Vec::new();
        for feature in rows
            .iter()
            .filter(|f| f.published && f.geom.intersects(&bounds))
        {
            let projected = feature.geom.map_coords(wgs84_to_webmercator);
            let geometry = clip_to_tile(&projected, envelope).map_err(|kind| {
                EncodeError::UnsupportedGeometry {
                    layer: layer.name().to_string(),
                    feature_id: feature.id,
                    kind,
                }
            })?;

            if let Some(geometry) = geometry {
                clipped.push(ClippedFeature {
                    id: feature.id,
                    properties: properties(feature),
                    geometry,
                });
            }
        }
        drop(features);

        debug!(
            layer = layer.name(),
            features = clipped.len(),
            "Clipped features for layer"
        );

        // No matching rows yields an empty buffer, as ST_AsMVT does
        if clipped.is_empty() {
            return Ok(Bytes::new());
        }
        Ok(encode_layer(layer.name(), &clipped)?)
    }
}

/// Densified tile bounds reprojected to EPSG:4326.
fn bounds_wgs84(envelope: &Envelope) -> Polygon<f64> {
    let ring = envelope.densified_ring().map_coords(webmercator_to_wgs84);
    Polygon::new(ring, vec![])
}

fn properties(feature: &Feature) -> Vec<(String, TileValue)> {
    let mut props = vec![
        ("id".to_string(), TileValue::Int(feature.id)),
        ("name".to_string(), TileValue::Str(feature.name.clone())),
        ("weight".to_string(), TileValue::Int(feature.weight)),
    ];
    if let Some(theme_id) = feature.theme_id {
        props.push(("theme_id".to_string(), TileValue::Int(theme_id)));
    }
    props.push(("tag_str".to_string(), TileValue::Str(feature.tag_str.clone())));
    props
}

// =============================================================================
// Clipping
// =============================================================================

/// Clip a Web Mercator geometry to the envelope and convert it to tile grid
/// coordinates.
///
/// Returns `Ok(None)` when nothing of the geometry survives, and the kind
/// name when the geometry type has no tile representation.
fn clip_to_tile(
    geom: &Geometry<f64>,
    envelope: &Envelope,
) -> Result<Option<TileGeometry>, &'static str> {
    let geometry = match geom {
        Geometry::Point(p) => clip_points(std::slice::from_ref(&p.0), envelope),
        Geometry::MultiPoint(mp) => {
            let coords: Vec<Coord<f64>> = mp.iter().map(|p| p.0).collect();
            clip_points(&coords, envelope)
        }
        Geometry::Line(line) => {
            clip_lines(&MultiLineString::new(vec![LineString::from(*line)]), envelope)
        }
        Geometry::LineString(ls) => clip_lines(&MultiLineString::new(vec![ls.clone()]), envelope),
        Geometry::MultiLineString(mls) => clip_lines(mls, envelope),
        Geometry::Polygon(poly) => clip_polygons(&MultiPolygon::new(vec![poly.clone()]), envelope),
        Geometry::MultiPolygon(mp) => clip_polygons(mp, envelope),
        Geometry::Rect(rect) => {
            clip_polygons(&MultiPolygon::new(vec![rect.to_polygon()]), envelope)
        }
        Geometry::Triangle(tri) => {
            clip_polygons(&MultiPolygon::new(vec![tri.to_polygon()]), envelope)
        }
        Geometry::GeometryCollection(_) => return Err("GeometryCollection"),
    };

    Ok(Some(geometry).filter(|g| !g.is_empty()))
}

fn clip_points(coords: &[Coord<f64>], envelope: &Envelope) -> TileGeometry {
    let points: Vec<TilePoint> = coords
        .iter()
        .filter(|c| envelope.contains(**c))
        .map(|c| to_tile_point(*c, envelope))
        .collect();
    TileGeometry::Points(points)
}

fn clip_lines(lines: &MultiLineString<f64>, envelope: &Envelope) -> TileGeometry {
    let clip = envelope.to_rect().to_polygon();
    let clipped = clip.clip(lines, false);

    let parts: Vec<Vec<TilePoint>> = clipped
        .iter()
        .map(|ls| to_tile_path(ls, envelope))
        .filter(|part| part.len() >= 2)
        .collect();
    TileGeometry::LineStrings(parts)
}

fn clip_polygons(polygons: &MultiPolygon<f64>, envelope: &Envelope) -> TileGeometry {
    let clip = MultiPolygon::new(vec![envelope.to_rect().to_polygon()]);
    let clipped = polygons.intersection(&clip);

    let mut out = Vec::new();
    for polygon in clipped.iter() {
        let Some(exterior) = to_tile_ring(polygon.exterior(), envelope) else {
            continue;
        };
        let mut rings = vec![exterior];
        rings.extend(
            polygon
                .interiors()
                .iter()
                .filter_map(|ring| to_tile_ring(ring, envelope)),
        );
        out.push(rings);
    }
    TileGeometry::Polygons(out)
}

/// Scale a projected coordinate into the tile grid, y pointing down.
fn to_tile_point(c: Coord<f64>, envelope: &Envelope) -> TilePoint {
    let extent = f64::from(DEFAULT_EXTENT);
    let x = (c.x - envelope.xmin) * extent / envelope.width();
    let y = (envelope.ymax - c.y) * extent / envelope.height();
    (x.round() as i32, y.round() as i32)
}

fn to_tile_path(line: &LineString<f64>, envelope: &Envelope) -> Vec<TilePoint> {
    let mut points: Vec<TilePoint> = line
        .coords()
        .map(|c| to_tile_point(*c, envelope))
        .collect();
    points.dedup();
    points
}

/// Ring in tile coordinates, or `None` if it collapses after snapping.
fn to_tile_ring(ring: &LineString<f64>, envelope: &Envelope) -> Option<Vec<TilePoint>> {
    let mut points = to_tile_path(ring, envelope);
    if points.first() != points.last() {
        let first = *points.first()?;
        points.push(first);
    }
    if points.len() < 4 || crate::mvt::ring_area(&points) == 0 {
        return None;
    }
    Some(points)
}
