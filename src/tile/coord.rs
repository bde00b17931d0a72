//! Tile coordinate validation.
//!
//! A tile request is rejected here, before any envelope math or store access,
//! when its zoom exceeds the configured maximum or when x/y fall outside the
//! `2^z × 2^z` grid of that zoom.

use std::fmt;
use std::str::FromStr;

use crate::error::TileError;

/// Default maximum zoom level served.
pub const DEFAULT_MAX_ZOOM: u8 = 22;

/// Hard upper bound for the configurable maximum zoom.
///
/// Keeps `2^z` and tile indexes inside `u32`.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Binary tile encodings accepted in the tile URL extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    /// `.pbf` - Mapbox Vector Tile, protobuf encoded
    Pbf,
    /// `.mvt` - same payload, alternative extension
    Mvt,
}

impl TileFormat {
    /// URL extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Pbf => "pbf",
            TileFormat::Mvt => "mvt",
        }
    }

    /// HTTP content type of the encoded payload.
    pub fn content_type(&self) -> &'static str {
        "application/vnd.mapbox-vector-tile"
    }
}

impl FromStr for TileFormat {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pbf" => Ok(TileFormat::Pbf),
            "mvt" => Ok(TileFormat::Mvt),
            other => Err(TileError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Returns `true` when `(z, x, y)` addresses an existing tile.
///
/// All three values must be non-negative, `z <= max_zoom`, and both `x` and
/// `y` strictly less than `2^z`.
pub fn is_valid(z: i64, x: i64, y: i64, max_zoom: u8) -> bool {
    check(z, x, y, max_zoom).is_ok()
}

fn check(z: i64, x: i64, y: i64, max_zoom: u8) -> Result<(), String> {
    let max_zoom = max_zoom.min(MAX_SUPPORTED_ZOOM);

    if z < 0 || x < 0 || y < 0 {
        return Err("tile coordinates must be non-negative".to_string());
    }
    if z > i64::from(max_zoom) {
        return Err(format!("zoom {} exceeds maximum zoom {}", z, max_zoom));
    }

    let size = 1i64 << z;
    if x >= size || y >= size {
        return Err(format!("x and y must be less than {} at zoom {}", size, z));
    }

    Ok(())
}

/// A validated tile address.
///
/// Instances only exist for coordinates that passed [`is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    z: u8,
    x: u32,
    y: u32,
    format: TileFormat,
}

impl TileCoord {
    /// Validate raw coordinates and build a tile address.
    pub fn new(
        z: i64,
        x: i64,
        y: i64,
        format: TileFormat,
        max_zoom: u8,
    ) -> Result<Self, TileError> {
        check(z, x, y, max_zoom).map_err(|reason| TileError::invalid_coordinate(z, x, y, reason))?;

        // Bounds were checked above, so these conversions cannot truncate
        Ok(Self {
            z: z as u8,
            x: x as u32,
            y: y as u32,
            format,
        })
    }

    /// Parse and validate the textual parts of a tile URL.
    ///
    /// Non-integer coordinates are reported as invalid coordinates; an
    /// unknown extension is reported as an unsupported format.
    pub fn parse(z: &str, x: &str, y: &str, format: &str, max_zoom: u8) -> Result<Self, TileError> {
        let parse = |value: &str, axis: &str| {
            value.parse::<i64>().map_err(|_| {
                TileError::invalid_coordinate(z, x, y, format!("{} is not an integer", axis))
            })
        };

        let zi = parse(z, "z")?;
        let xi = parse(x, "x")?;
        let yi = parse(y, "y")?;
        let format = format.parse::<TileFormat>()?;

        Self::new(zi, xi, yi, format, max_zoom)
    }

    pub fn z(&self) -> u8 {
        self.z
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Number of tiles along one axis at this zoom.
    pub fn grid_size(&self) -> u64 {
        1u64 << self.z
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}.{}", self.z, self.x, self.y, self.format)
    }
}
