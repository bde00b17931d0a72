use thiserror::Error;

/// Errors raised by the spatial store while producing a layer.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached (connection refused, pool closed, TLS failure)
    #[error("Spatial store unavailable: {0}")]
    Unavailable(String),

    /// The layer query did not complete before the configured deadline
    #[error("Spatial store timed out after {after_ms}ms while querying layer '{layer}'")]
    Timeout { layer: &'static str, after_ms: u64 },

    /// The store rejected or failed the layer query
    #[error("Query for layer '{layer}' failed: {message}")]
    Query {
        layer: &'static str,
        message: String,
    },
}

/// Errors raised while packing clipped geometries into a layer buffer.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// Geometry is structurally unusable (too few vertices, empty parts)
    #[error("Invalid geometry for feature {feature_id} in layer '{layer}': {reason}")]
    InvalidGeometry {
        layer: String,
        feature_id: i64,
        reason: String,
    },

    /// Geometry kind has no vector tile representation
    #[error("Unsupported geometry type {kind} for feature {feature_id} in layer '{layer}'")]
    UnsupportedGeometry {
        layer: String,
        feature_id: i64,
        kind: &'static str,
    },
}

/// Errors that can occur while serving a tile.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// z/x/y is negative, not an integer, or outside the grid for its zoom
    #[error("Invalid tile coordinate {z}/{x}/{y}: {reason}")]
    InvalidTileCoordinate {
        z: String,
        x: String,
        y: String,
        reason: String,
    },

    /// Requested tile format is not served
    #[error("Unsupported tile format: {format} (expected pbf or mvt)")]
    UnsupportedFormat { format: String },

    /// Spatial store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Layer encoding failure
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodeError),
}

impl TileError {
    /// Build an [`TileError::InvalidTileCoordinate`] from any displayable parts.
    pub fn invalid_coordinate(
        z: impl ToString,
        x: impl ToString,
        y: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TileError::InvalidTileCoordinate {
            z: z.to_string(),
            x: x.to_string(),
            y: y.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error is the caller's fault (maps to a 4xx response).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TileError::InvalidTileCoordinate { .. } | TileError::UnsupportedFormat { .. }
        )
    }
}

/// Errors raised while loading the runtime settings file.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("Failed to read settings file {path}: {message}")]
    Read { path: String, message: String },

    /// The settings file is not valid JSON or has the wrong shape
    #[error("Failed to parse settings file {path}: {message}")]
    Parse { path: String, message: String },
}
