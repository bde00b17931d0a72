//! HTTP request handlers for the vector tile API.
//!
//! # Endpoints
//!
//! - `GET /tiles/{z}/{x}/{y}.{format}` - Serve a vector tile
//! - `GET /tiles.json` - TileJSON descriptor
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{EncodeError, StoreError, TileError};
use crate::store::SpatialStore;
use crate::tile::{TileRequest, TileService};

use super::tilejson::{describe, request_origin, TileJson, DEFAULT_TILESET_NAME};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
pub struct AppState<S: SpatialStore> {
    pub tile_service: Arc<TileService<S>>,

    /// Display name reported by the TileJSON descriptor
    pub tileset_name: Arc<str>,

    /// Whether `X-Forwarded-*` headers name the public origin
    pub trust_forwarded_headers: bool,
}

impl<S: SpatialStore> AppState<S> {
    pub fn new(tile_service: TileService<S>) -> Self {
        Self::with_shared_service(Arc::new(tile_service))
    }

    pub fn with_shared_service(tile_service: Arc<TileService<S>>) -> Self {
        Self {
            tile_service,
            tileset_name: Arc::from(DEFAULT_TILESET_NAME),
            trust_forwarded_headers: false,
        }
    }

    pub fn with_tileset_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.tileset_name = name.into();
        self
    }

    pub fn with_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

impl<S: SpatialStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            tileset_name: Arc::clone(&self.tileset_name),
            trust_forwarded_headers: self.trust_forwarded_headers,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{z}/{x}/{filename}` where filename is `{y}.{format}`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub z: String,
    pub x: String,
    pub filename: String,
}

impl TilePathParams {
    /// Split the filename into the y coordinate and the format extension.
    ///
    /// A filename without an extension yields an empty format.
    pub fn y_and_format(&self) -> (&str, &str) {
        self.filename
            .rsplit_once('.')
            .unwrap_or((self.filename.as_str(), ""))
    }

    pub fn to_request(&self) -> TileRequest {
        let (y, format) = self.y_and_format();
        TileRequest::new(self.z.as_str(), self.x.as_str(), y, format)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_tile_coordinate")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    pub status: u16,
}

impl ErrorResponse {
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl TileError {
    /// HTTP status and error type identifier for this error.
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            TileError::InvalidTileCoordinate { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_tile_coordinate")
            }
            TileError::UnsupportedFormat { .. } => (StatusCode::BAD_REQUEST, "unsupported_format"),
            TileError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            TileError::Store(StoreError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "store_timeout")
            }
            TileError::Store(StoreError::Query { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_query_failed")
            }
            TileError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encoding_error"),
        }
    }
}

/// Convert TileError to HTTP response.
///
/// Client errors are logged at WARN level, everything else at ERROR level
/// with the failing layer and feature when known.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        if self.is_client_error() {
            warn!(error_type, status = status.as_u16(), "Client error: {}", message);
        } else {
            match &self {
                TileError::Store(StoreError::Timeout { layer, .. })
                | TileError::Store(StoreError::Query { layer, .. }) => {
                    error!(
                        error_type,
                        status = status.as_u16(),
                        layer = *layer,
                        "Server error: {}",
                        message
                    );
                }
                TileError::Encoding(EncodeError::InvalidGeometry {
                    layer, feature_id, ..
                })
                | TileError::Encoding(EncodeError::UnsupportedGeometry {
                    layer, feature_id, ..
                }) => {
                    error!(
                        error_type,
                        status = status.as_u16(),
                        layer = layer.as_str(),
                        feature_id = *feature_id,
                        "Server error: {}",
                        message
                    );
                }
                _ => {
                    error!(error_type, status = status.as_u16(), "Server error: {}", message);
                }
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{z}/{x}/{y}.{format}` where format is `pbf` or `mvt`
///
/// # Response
///
/// - `200 OK`: the tile, every layer present even when empty
/// - `400 Bad Request`: invalid coordinate or format
/// - `500 Internal Server Error`: query or encoding failure
/// - `503 Service Unavailable`: store unreachable
/// - `504 Gateway Timeout`: store query deadline exceeded
///
/// # Headers
///
/// - `Content-Type: application/vnd.mapbox-vector-tile`
/// - `Cache-Control: public, max-age={current cache TTL}`
/// - `X-Tile-Cache-Hit: true|false`
pub async fn tile_handler<S: SpatialStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError> {
    let request = params.to_request();
    let response = state.tile_service.get_tile(&request).await?;

    let headers = [
        (header::CONTENT_TYPE, response.format.content_type().to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", response.ttl.as_secs()),
        ),
        (
            header::HeaderName::from_static("x-tile-cache-hit"),
            response.cache_hit.to_string(),
        ),
    ];

    Ok((StatusCode::OK, headers, response.data).into_response())
}

/// Handle TileJSON requests.
///
/// # Endpoint
///
/// `GET /tiles.json`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "tileJSON": "2.2.0",
///   "name": "Memory Map Toolkit Interactive Features",
///   "tiles": ["https://maps.example.org/tiles/{z}/{x}/{y}.pbf"]
/// }
/// ```
pub async fn tilejson_handler<S: SpatialStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Json<TileJson> {
    let (scheme, host) = request_origin(&headers, state.trust_forwarded_headers);
    Json(describe(&scheme, &host, &state.tileset_name))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
