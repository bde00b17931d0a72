//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Tiles always carry the three layers, even when empty
//! - Error cases (invalid coordinates, unsupported format, store failures)
//! - HTTP response codes and headers
//! - TileJSON descriptor built from the request origin

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;

use mmt_tiles::store::MemoryStore;
use mmt_tiles::tile::TileService;
use mmt_tiles::{create_router, RouterConfig};

use super::test_utils::{
    get, get_with_headers, layer_names, CountingStore, StalledStore, UnreachableStore,
};

fn memory_router() -> Router {
    create_router(
        TileService::new(MemoryStore::new()),
        RouterConfig::new().with_tracing(false),
    )
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_empty_world_tile_has_all_layers() {
    let router = memory_router();

    let response = get(&router, "/tiles/0/0/0.pbf").await;
    assert_eq!(response.status, StatusCode::OK);

    let tile = response.tile();
    assert_eq!(layer_names(&tile), vec!["points", "lines", "polygons"]);
    assert!(tile.layers.iter().all(|l| l.features.is_empty()));
    assert!(tile.layers.iter().all(|l| l.version == 2));
}

#[tokio::test]
async fn test_tile_headers() {
    let router = memory_router();

    let response = get(&router, "/tiles/3/2/5.pbf").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.mapbox-vector-tile"
    );
    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert_eq!(response.header("cache-control"), "public, max-age=60");
    assert_eq!(response.header("x-tile-cache-hit"), "false");
}

#[tokio::test]
async fn test_mvt_extension_serves_same_payload() {
    let router = memory_router();

    let pbf = get(&router, "/tiles/4/3/7.pbf").await;
    let mvt = get(&router, "/tiles/4/3/7.mvt").await;
    assert_eq!(mvt.status, StatusCode::OK);
    assert_eq!(pbf.body, mvt.body);
}

// =============================================================================
// Validation Errors
// =============================================================================

#[tokio::test]
async fn test_out_of_range_tile_never_reaches_store() {
    let store = CountingStore::new(MemoryStore::new());
    let queries = store.counter();
    let router = create_router(
        TileService::new(store),
        RouterConfig::new().with_tracing(false),
    );

    let response = get(&router, "/tiles/10/1024/2000.pbf").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_tile_coordinate");
    assert_eq!(queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_coordinates() {
    let router = memory_router();

    for uri in [
        "/tiles/-1/0/0.pbf",
        "/tiles/0/1/0.pbf",
        "/tiles/2/0/4.pbf",
        "/tiles/23/0/0.pbf",
        "/tiles/abc/0/0.pbf",
        "/tiles/1/0/1.5.pbf",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_unsupported_format() {
    let router = memory_router();

    let response = get(&router, "/tiles/0/0/0.png").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let error = response.json();
    assert_eq!(error["error"], "unsupported_format");
    assert_eq!(error["status"], 400);

    let response = get(&router, "/tiles/0/0/0").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_max_zoom_is_configurable() {
    let router = create_router(
        TileService::new(MemoryStore::new()).with_max_zoom(12),
        RouterConfig::new().with_tracing(false),
    );

    assert_eq!(get(&router, "/tiles/12/0/0.pbf").await.status, StatusCode::OK);
    assert_eq!(
        get(&router, "/tiles/13/0/0.pbf").await.status,
        StatusCode::BAD_REQUEST
    );
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn test_unreachable_store_is_503() {
    let router = create_router(
        TileService::new(UnreachableStore),
        RouterConfig::new().with_tracing(false),
    );

    let response = get(&router, "/tiles/1/0/0.pbf").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["error"], "store_unavailable");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_store_is_504() {
    let router = create_router(
        TileService::new(StalledStore).with_store_timeout(Duration::from_millis(100)),
        RouterConfig::new().with_tracing(false),
    );

    let response = get(&router, "/tiles/1/0/0.pbf").await;
    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.json()["error"], "store_timeout");
}

// =============================================================================
// TileJSON and Health
// =============================================================================

#[tokio::test]
async fn test_tilejson_uses_host_header() {
    let router = memory_router();

    let response = get_with_headers(&router, "/tiles.json", &[("host", "tiles.local:8000")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), "*");

    let doc = response.json();
    assert_eq!(doc["tileJSON"], "2.2.0");
    assert_eq!(doc["name"], "Memory Map Toolkit Interactive Features");
    assert_eq!(
        doc["tiles"][0],
        "http://tiles.local:8000/tiles/{z}/{x}/{y}.pbf"
    );
}

#[tokio::test]
async fn test_tilejson_behind_proxy() {
    let router = create_router(
        TileService::new(MemoryStore::new()),
        RouterConfig::new()
            .with_tracing(false)
            .with_tileset_name("Walking Tours")
            .with_forwarded_headers(true),
    );

    let response = get_with_headers(
        &router,
        "/tiles.json",
        &[
            ("host", "10.0.0.5:8000"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "maps.example.org"),
        ],
    )
    .await;

    let doc = response.json();
    assert_eq!(doc["name"], "Walking Tours");
    assert_eq!(
        doc["tiles"][0],
        "https://maps.example.org/tiles/{z}/{x}/{y}.pbf"
    );
}

#[tokio::test]
async fn test_tilejson_ignores_forwarded_headers_by_default() {
    let router = memory_router();

    let response = get_with_headers(
        &router,
        "/tiles.json",
        &[
            ("host", "tiles.local:8000"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "attacker.example"),
        ],
    )
    .await;

    assert_eq!(
        response.json()["tiles"][0],
        "http://tiles.local:8000/tiles/{z}/{x}/{y}.pbf"
    );
}

#[tokio::test]
async fn test_health() {
    let router = memory_router();

    let response = get(&router, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
}
