//! Cache integration tests.
//!
//! Tests verify:
//! - Repeat requests within the TTL are served without touching the store
//! - Entries expire once the TTL elapses
//! - TTL changes at runtime apply to the next request
//! - A zero TTL disables caching

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;

use mmt_tiles::settings::RuntimeSettings;
use mmt_tiles::store::MemoryStore;
use mmt_tiles::tile::TileService;
use mmt_tiles::{create_router, RouterConfig};

use super::test_utils::{get, CountingStore};

/// Layer queries issued per rendered tile.
const QUERIES_PER_TILE: usize = 3;

fn counting_router(settings: RuntimeSettings) -> (Router, Arc<AtomicUsize>) {
    let store = CountingStore::new(MemoryStore::new());
    let queries = store.counter();
    let router = create_router(
        TileService::new(store).with_ttl_source(settings),
        RouterConfig::new().with_tracing(false),
    );
    (router, queries)
}

// =============================================================================
// Hits and Expiry
// =============================================================================

#[tokio::test]
async fn test_repeat_request_is_cache_hit() {
    let (router, queries) = counting_router(RuntimeSettings::default());

    let first = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header("x-tile-cache-hit"), "false");
    assert_eq!(queries.load(Ordering::SeqCst), QUERIES_PER_TILE);

    let second = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(second.header("x-tile-cache-hit"), "true");
    assert_eq!(second.body, first.body);
    assert_eq!(queries.load(Ordering::SeqCst), QUERIES_PER_TILE);
}

#[tokio::test]
async fn test_different_tiles_cached_independently() {
    let (router, queries) = counting_router(RuntimeSettings::default());

    get(&router, "/tiles/5/10/10.pbf").await;
    let other = get(&router, "/tiles/5/11/10.pbf").await;
    assert_eq!(other.header("x-tile-cache-hit"), "false");
    assert_eq!(queries.load(Ordering::SeqCst), 2 * QUERIES_PER_TILE);

    let again = get(&router, "/tiles/5/10/10.pbf").await;
    assert_eq!(again.header("x-tile-cache-hit"), "true");
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let (router, queries) = counting_router(RuntimeSettings::new(Duration::from_secs(60)));

    get(&router, "/tiles/2/1/1.pbf").await;

    tokio::time::advance(Duration::from_secs(59)).await;
    let cached = get(&router, "/tiles/2/1/1.pbf").await;
    assert_eq!(cached.header("x-tile-cache-hit"), "true");

    tokio::time::advance(Duration::from_secs(2)).await;
    let fresh = get(&router, "/tiles/2/1/1.pbf").await;
    assert_eq!(fresh.header("x-tile-cache-hit"), "false");
    assert_eq!(queries.load(Ordering::SeqCst), 2 * QUERIES_PER_TILE);
}

// =============================================================================
// Runtime TTL
// =============================================================================

#[tokio::test]
async fn test_zero_ttl_disables_caching() {
    let (router, queries) = counting_router(RuntimeSettings::new(Duration::ZERO));

    for _ in 0..3 {
        let response = get(&router, "/tiles/1/1/0.pbf").await;
        assert_eq!(response.header("x-tile-cache-hit"), "false");
        assert_eq!(response.header("cache-control"), "public, max-age=0");
    }
    assert_eq!(queries.load(Ordering::SeqCst), 3 * QUERIES_PER_TILE);
}

#[tokio::test]
async fn test_ttl_change_applies_to_next_request() {
    let settings = RuntimeSettings::new(Duration::from_secs(60));
    let (router, queries) = counting_router(settings.clone());

    get(&router, "/tiles/3/4/4.pbf").await;
    assert_eq!(queries.load(Ordering::SeqCst), QUERIES_PER_TILE);

    settings.set_cache_ttl(Duration::ZERO);
    let response = get(&router, "/tiles/3/4/4.pbf").await;
    assert_eq!(response.header("x-tile-cache-hit"), "false");
    assert_eq!(response.header("cache-control"), "public, max-age=0");
    assert_eq!(queries.load(Ordering::SeqCst), 2 * QUERIES_PER_TILE);
}

#[tokio::test]
async fn test_ttl_reloaded_from_settings_file() {
    let settings = RuntimeSettings::default();
    let (router, _queries) = counting_router(settings.clone());

    let before = get(&router, "/tiles/0/0/0.pbf").await;
    assert_eq!(before.header("cache-control"), "public, max-age=60");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"cache_ttl": 15}}"#).unwrap();
    let ttl = settings.reload_from_file(file.path()).await.unwrap();
    assert_eq!(ttl, Duration::from_secs(15));

    let after = get(&router, "/tiles/1/0/0.pbf").await;
    assert_eq!(after.header("cache-control"), "public, max-age=15");
}

#[tokio::test]
async fn test_bad_settings_file_keeps_ttl() {
    let settings = RuntimeSettings::new(Duration::from_secs(30));
    let (router, _queries) = counting_router(settings.clone());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(settings.reload_from_file(file.path()).await.is_err());

    let response = get(&router, "/tiles/0/0/0.pbf").await;
    assert_eq!(response.header("cache-control"), "public, max-age=30");
}

#[tokio::test]
async fn test_oversized_ttl_does_not_break_serving() {
    let settings = RuntimeSettings::default();
    let (router, queries) = counting_router(settings.clone());

    settings.set_cache_ttl(Duration::from_secs(u64::MAX));
    let first = get(&router, "/tiles/2/2/2.pbf").await;
    assert_eq!(first.status, StatusCode::OK);

    let second = get(&router, "/tiles/2/2/2.pbf").await;
    assert_eq!(second.header("x-tile-cache-hit"), "true");
    assert_eq!(queries.load(Ordering::SeqCst), QUERIES_PER_TILE);
}
