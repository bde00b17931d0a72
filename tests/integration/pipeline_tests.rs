//! Feature pipeline integration tests.
//!
//! Tests verify that features are selected by tile bounds, clipped and
//! projected into tile coordinates, and encoded with their properties.

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use geo::{line_string, polygon, Point};

use mmt_tiles::store::{Feature, Layer, MemoryStore};
use mmt_tiles::tile::TileService;
use mmt_tiles::{create_router, RouterConfig};

use super::test_utils::{feature_count, get, tile_center};

fn router_for(store: MemoryStore) -> Router {
    create_router(
        TileService::new(store).with_ttl_source(Duration::ZERO),
        RouterConfig::new().with_tracing(false),
    )
}

async fn store_with_point_at(z: u32, x: u32, y: u32) -> MemoryStore {
    let (lon, lat) = tile_center(z, x, y);
    let store = MemoryStore::new();
    store
        .insert(
            Layer::Points,
            Feature::new(7, Point::new(lon, lat))
                .with_name("Old harbour")
                .with_weight(3)
                .with_theme(2)
                .with_tags("history,harbour"),
        )
        .await;
    store
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_point_only_in_its_tile() {
    let router = router_for(store_with_point_at(5, 10, 10).await);

    let inside = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(inside.status, StatusCode::OK);
    let tile = inside.tile();
    assert_eq!(feature_count(&tile, "points"), 1);
    assert_eq!(feature_count(&tile, "lines"), 0);
    assert_eq!(feature_count(&tile, "polygons"), 0);

    let neighbour = get(&router, "/tiles/5/11/10.pbf").await;
    assert_eq!(feature_count(&neighbour.tile(), "points"), 0);
}

#[tokio::test]
async fn test_point_visible_from_parent_tiles() {
    let router = router_for(store_with_point_at(5, 10, 10).await);

    // 5/10/10 lies inside 4/5/5 and 0/0/0
    assert_eq!(feature_count(&get(&router, "/tiles/4/5/5.pbf").await.tile(), "points"), 1);
    assert_eq!(feature_count(&get(&router, "/tiles/0/0/0.pbf").await.tile(), "points"), 1);
}

#[tokio::test]
async fn test_unpublished_features_are_hidden() {
    let (lon, lat) = tile_center(5, 10, 10);
    let store = MemoryStore::new();
    store
        .insert(Layer::Points, Feature::new(1, Point::new(lon, lat)).unpublished())
        .await;
    let router = router_for(store);

    let response = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(feature_count(&response.tile(), "points"), 0);
}

// =============================================================================
// Encoding
// =============================================================================

#[tokio::test]
async fn test_point_feature_encoding() {
    let router = router_for(store_with_point_at(5, 10, 10).await);

    let tile = get(&router, "/tiles/5/10/10.pbf").await.tile();
    let layer = tile.layers.iter().find(|l| l.name == "points").unwrap();
    assert_eq!(layer.extent, Some(4096));

    let feature = &layer.features[0];
    assert_eq!(feature.id, Some(7));
    // MoveTo(1) then the zig-zag encoded center of the tile
    assert_eq!(feature.geometry[0], 9);

    let mut keys = layer.keys.clone();
    keys.sort();
    assert_eq!(keys, vec!["id", "name", "tag_str", "theme_id", "weight"]);
    assert!(layer
        .values
        .iter()
        .any(|v| v.string_value.as_deref() == Some("Old harbour")));
}

#[tokio::test]
async fn test_theme_id_omitted_when_unset() {
    let (lon, lat) = tile_center(3, 2, 2);
    let store = MemoryStore::new();
    store
        .insert(Layer::Points, Feature::new(1, Point::new(lon, lat)))
        .await;
    let router = router_for(store);

    let tile = get(&router, "/tiles/3/2/2.pbf").await.tile();
    let layer = tile.layers.iter().find(|l| l.name == "points").unwrap();
    assert!(!layer.keys.iter().any(|k| k == "theme_id"));
}

#[tokio::test]
async fn test_line_and_polygon_are_clipped_into_tile() {
    let (lon, lat) = tile_center(6, 20, 20);
    let store = MemoryStore::new();
    store
        .insert(
            Layer::Lines,
            Feature::new(
                11,
                line_string![(x: lon - 20.0, y: lat), (x: lon + 20.0, y: lat)],
            ),
        )
        .await;
    store
        .insert(
            Layer::Polygons,
            Feature::new(
                12,
                polygon![
                    (x: lon - 10.0, y: lat - 5.0),
                    (x: lon + 10.0, y: lat - 5.0),
                    (x: lon + 10.0, y: lat + 5.0),
                    (x: lon - 10.0, y: lat + 5.0),
                ],
            ),
        )
        .await;
    let router = router_for(store);

    let tile = get(&router, "/tiles/6/20/20.pbf").await.tile();
    assert_eq!(feature_count(&tile, "lines"), 1);
    assert_eq!(feature_count(&tile, "polygons"), 1);

    let lines = tile.layers.iter().find(|l| l.name == "lines").unwrap();
    // LineString geometry type
    assert_eq!(lines.features[0].r#type, Some(2));
    let polygons = tile.layers.iter().find(|l| l.name == "polygons").unwrap();
    assert_eq!(polygons.features[0].r#type, Some(3));
}

#[tokio::test]
async fn test_rendering_is_deterministic() {
    let router = router_for(store_with_point_at(5, 10, 10).await);

    let first = get(&router, "/tiles/5/10/10.pbf").await;
    let second = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(second.header("x-tile-cache-hit"), "false");
    assert_eq!(first.body, second.body);
}
