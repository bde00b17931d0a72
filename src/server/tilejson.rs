//! TileJSON descriptor.
//!
//! The tile URL template is built from the scheme and host the client used,
//! so the descriptor stays correct under any domain alias. Behind a reverse
//! proxy the `X-Forwarded-*` headers are honoured only when the server is
//! configured to trust them; otherwise any client could pick the host.

use axum::http::{header, HeaderMap};
use serde::Serialize;

/// TileJSON schema version advertised by the descriptor.
pub const TILEJSON_VERSION: &str = "2.2.0";

/// Default display name of the tileset.
pub const DEFAULT_TILESET_NAME: &str = "Memory Map Toolkit Interactive Features";

/// Host used when the request names none.
const FALLBACK_HOST: &str = "localhost";

/// TileJSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileJson {
    #[serde(rename = "tileJSON")]
    pub tile_json: String,
    pub name: String,
    pub tiles: Vec<String>,
}

/// Describe the tileset as seen from `scheme://host`.
pub fn describe(scheme: &str, host: &str, name: &str) -> TileJson {
    TileJson {
        tile_json: TILEJSON_VERSION.to_string(),
        name: name.to_string(),
        tiles: vec![format!("{}://{}/tiles/{{z}}/{{x}}/{{y}}.pbf", scheme, host)],
    }
}

/// Scheme and host of the request.
///
/// With `trust_forwarded` set, proxy headers (`X-Forwarded-Proto`,
/// `X-Forwarded-Host`) take precedence. Otherwise the scheme is `http` and
/// the host comes from `Host`.
pub fn request_origin(headers: &HeaderMap, trust_forwarded: bool) -> (String, String) {
    let forwarded = |name: &str| {
        if trust_forwarded {
            first_value(headers, name)
        } else {
            None
        }
    };

    let scheme = forwarded("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = forwarded("x-forwarded-host")
        .or_else(|| first_value(headers, header::HOST.as_str()))
        .unwrap_or_else(|| FALLBACK_HOST.to_string());
    (scheme, host)
}

/// First entry of a possibly comma-separated header value.
fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
