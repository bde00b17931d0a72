//! Tile envelope computation in Web Mercator (EPSG:3857).
//!
//! Tile space has its origin at the upper-left corner with y growing
//! downwards; the projection has y growing upwards, so tile row `y` spans
//! `ymax = WORLD_MERC_MAX - y * size` down to `ymin = ymax - size`.

use geo::{coord, Coord, LineString, Rect};

use super::coord::TileCoord;

/// Half the Web Mercator world width in meters.
pub const WORLD_MERC_MAX: f64 = 20037508.3427892;

/// Lower bound of the Web Mercator world on both axes.
pub const WORLD_MERC_MIN: f64 = -WORLD_MERC_MAX;

/// Number of segments each envelope edge is split into before reprojection.
pub const DENSIFY_FACTOR: f64 = 4.0;

/// Equatorial radius of the WGS84 ellipsoid, as used by Web Mercator.
const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit of the square Web Mercator world.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Bounding box of a tile in EPSG:3857 plus the densification step length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    /// Maximum edge segment length used when densifying the bounds
    pub seg_size: f64,
}

impl Envelope {
    /// Compute the envelope of a validated tile.
    pub fn from_tile(tile: &TileCoord) -> Self {
        tile_to_envelope(tile.z(), tile.x(), tile.y())
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// The envelope as an axis-aligned rectangle (the clipping box).
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.xmin, y: self.ymin },
            coord! { x: self.xmax, y: self.ymax },
        )
    }

    /// Whether a projected coordinate lies inside or on the envelope.
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.xmin && c.x <= self.xmax && c.y >= self.ymin && c.y <= self.ymax
    }

    /// Closed exterior ring of the envelope with every edge split into
    /// segments no longer than `seg_size`.
    ///
    /// Vertices run counter-clockwise starting at the lower-left corner.
    pub fn densified_ring(&self) -> LineString<f64> {
        let corners = [
            coord! { x: self.xmin, y: self.ymin },
            coord! { x: self.xmax, y: self.ymin },
            coord! { x: self.xmax, y: self.ymax },
            coord! { x: self.xmin, y: self.ymax },
        ];

        let mut coords = Vec::new();
        for (i, start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            let length = ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt();
            let steps = if self.seg_size > 0.0 {
                // tolerance so an exact multiple of seg_size is not split once more
                (length / self.seg_size - 1e-9).ceil().max(1.0) as usize
            } else {
                1
            };
            for step in 0..steps {
                let t = step as f64 / steps as f64;
                coords.push(coord! {
                    x: start.x + (end.x - start.x) * t,
                    y: start.y + (end.y - start.y) * t,
                });
            }
        }
        coords.push(corners[0]);

        LineString::new(coords)
    }
}

/// Convert a tile address into its EPSG:3857 envelope.
///
/// The caller must have validated the coordinate. Shared edges of adjacent
/// tiles are computed with identical arithmetic, so `xmax` of column `x`
/// equals `xmin` of column `x + 1` exactly.
pub fn tile_to_envelope(z: u8, x: u32, y: u32) -> Envelope {
    let world_size = WORLD_MERC_MAX - WORLD_MERC_MIN;
    let tile_size = world_size / (1u64 << z) as f64;

    let xmin = WORLD_MERC_MIN + tile_size * f64::from(x);
    let xmax = WORLD_MERC_MIN + tile_size * (f64::from(x) + 1.0);
    let ymin = WORLD_MERC_MAX - tile_size * (f64::from(y) + 1.0);
    let ymax = WORLD_MERC_MAX - tile_size * f64::from(y);

    Envelope {
        xmin,
        ymin,
        xmax,
        ymax,
        seg_size: (xmax - xmin) / DENSIFY_FACTOR,
    }
}

/// Project a WGS84 longitude/latitude coordinate to Web Mercator meters.
pub fn wgs84_to_webmercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = c.x.to_radians() * EARTH_RADIUS;
    let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    coord! { x: x, y: y }
}

/// Inverse of [`wgs84_to_webmercator`].
pub fn webmercator_to_wgs84(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    coord! { x: lon, y: lat }
}
