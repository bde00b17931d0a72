//! Geometry command encoding for vector tile features.
//!
//! Coordinates are tile-local integers. They are handed to geozero's MVT
//! writer as `geo` geometries, which emits `MoveTo`/`LineTo`/`ClosePath`
//! commands with zigzag-encoded deltas from a cursor that carries over
//! between parts of the same feature.
//!
//! See <https://github.com/mapbox/vector-tile-spec/tree/master/2.1#43-geometry-encoding>

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geozero::error::GeozeroError;
use geozero::mvt::tile::GeomType;
use geozero::ToMvt;

/// A vertex in tile-local integer space.
pub type TilePoint = (i32, i32);

/// Clipped geometry in tile-local coordinates, ready to encode.
///
/// Polygon rings are closed (first vertex repeated at the end). The first
/// ring of each polygon is its exterior; the encoder fixes winding order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileGeometry {
    Points(Vec<TilePoint>),
    LineStrings(Vec<Vec<TilePoint>>),
    Polygons(Vec<Vec<Vec<TilePoint>>>),
}

impl TileGeometry {
    pub fn geom_type(&self) -> GeomType {
        match self {
            TileGeometry::Points(_) => GeomType::Point,
            TileGeometry::LineStrings(_) => GeomType::Linestring,
            TileGeometry::Polygons(_) => GeomType::Polygon,
        }
    }

    /// True when nothing of the geometry survived clipping.
    pub fn is_empty(&self) -> bool {
        match self {
            TileGeometry::Points(points) => points.is_empty(),
            TileGeometry::LineStrings(lines) => lines.is_empty(),
            TileGeometry::Polygons(polygons) => polygons.is_empty(),
        }
    }

    /// Check the structural rules of the tile geometry encoding.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TileGeometry::Points(points) if points.is_empty() => {
                Err("point geometry has no vertices".to_string())
            }
            TileGeometry::Points(_) => Ok(()),
            TileGeometry::LineStrings(lines) => {
                if lines.is_empty() {
                    return Err("line geometry has no parts".to_string());
                }
                for line in lines {
                    if line.len() < 2 {
                        return Err(format!("line has {} vertex, need at least 2", line.len()));
                    }
                }
                Ok(())
            }
            TileGeometry::Polygons(polygons) => {
                if polygons.is_empty() {
                    return Err("polygon geometry has no parts".to_string());
                }
                for polygon in polygons {
                    if polygon.is_empty() {
                        return Err("polygon has no rings".to_string());
                    }
                    for ring in polygon {
                        if ring.len() < 4 {
                            return Err(format!(
                                "ring has {} vertices, need at least 4 including closure",
                                ring.len()
                            ));
                        }
                        if ring.first() != ring.last() {
                            return Err("ring is not closed".to_string());
                        }
                        if ring_area(ring) == 0 {
                            return Err("ring has zero area".to_string());
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Encode into the command integer stream. Call [`validate`](Self::validate) first.
    ///
    /// Rings are oriented here (exteriors clockwise in y-down tile space,
    /// holes counter-clockwise) since the writer emits them as given.
    pub fn encode(&self) -> Result<Vec<u32>, GeozeroError> {
        let geometry: Geometry<f64> = match self {
            TileGeometry::Points(points) => {
                MultiPoint::new(points.iter().map(|&p| Point::from(to_coord(p))).collect()).into()
            }
            TileGeometry::LineStrings(lines) => {
                MultiLineString::new(lines.iter().map(|line| to_line_string(line)).collect())
                    .into()
            }
            TileGeometry::Polygons(polygons) => {
                MultiPolygon::new(polygons.iter().map(|rings| to_polygon(rings)).collect()).into()
            }
        };
        let feature = geometry.to_mvt_unscaled()?;
        Ok(feature.geometry)
    }
}

fn to_coord((x, y): TilePoint) -> Coord<f64> {
    Coord {
        x: f64::from(x),
        y: f64::from(y),
    }
}

fn to_line_string(points: &[TilePoint]) -> LineString<f64> {
    LineString::new(points.iter().copied().map(to_coord).collect())
}

fn to_polygon(rings: &[Vec<TilePoint>]) -> Polygon<f64> {
    let mut oriented = rings.iter().enumerate().map(|(i, ring)| {
        let area = ring_area(ring);
        // exterior rings need positive area in y-down tile space
        let reverse = if i == 0 { area < 0 } else { area > 0 };
        if reverse {
            LineString::new(ring.iter().rev().copied().map(to_coord).collect())
        } else {
            to_line_string(ring)
        }
    });
    let exterior = oriented.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, oriented.collect())
}

/// Twice the signed area of a closed ring (surveyor's formula).
///
/// Positive means clockwise when drawn with y pointing down.
pub fn ring_area(ring: &[TilePoint]) -> i64 {
    ring.windows(2)
        .map(|w| {
            let (x0, y0) = (i64::from(w[0].0), i64::from(w[0].1));
            let (x1, y1) = (i64::from(w[1].0), i64::from(w[1].1));
            x0 * y1 - x1 * y0
        })
        .sum()
}
