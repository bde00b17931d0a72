//! mmt-tiles - A vector tile server for Memory Map Toolkit feature layers.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mmt_tiles::{
    config::Config,
    server::{create_router, RouterConfig},
    settings::{spawn_settings_reloader, RuntimeSettings},
    store::{PostgisStore, PostgisStoreConfig, LAYERS},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

// =============================================================================
// Serve
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("mmt-tiles v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Max zoom: {}", config.max_zoom);
    info!(
        "  Store: {} connections, {}ms per-layer timeout",
        config.pool_size, config.store_timeout_ms
    );
    info!(
        "  Cache: {}s TTL, {}MB",
        config.cache_ttl,
        config.cache_capacity / (1024 * 1024)
    );
    if config.cache_ttl == 0 {
        warn!("  Cache: DISABLED - every request queries the store");
    }
    for spec in LAYERS.iter() {
        info!("  Layer '{}' <- {}", spec.name, spec.source);
    }

    let store = match PostgisStore::connect_lazy(&PostgisStoreConfig {
        database_url: config.database_url.clone(),
        pool_size: config.pool_size,
        acquire_timeout: config.pool_acquire_timeout(),
    }) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to configure the database pool: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = RuntimeSettings::new(config.cache_ttl());
    if let Some(ref path) = config.settings_file {
        info!("  Settings file: {} (every {}s)", path.display(), config.settings_poll_secs);
        spawn_settings_reloader(
            path.clone(),
            settings.clone(),
            config.settings_poll_interval(),
        );
    }

    let tile_service = TileService::new(store)
        .with_cache_capacity(config.cache_capacity)
        .with_ttl_source(settings)
        .with_max_zoom(config.max_zoom)
        .with_store_timeout(config.store_timeout());

    let router_config = RouterConfig::new()
        .with_tileset_name(config.tileset_name.clone())
        .with_forwarded_headers(config.trust_forwarded_headers)
        .with_tracing(!config.no_tracing);

    let router = create_router(tile_service, router_config);

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/tiles.json", addr);
    info!("    curl http://{}/tiles/0/0/0.pbf", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "mmt_tiles=debug,tower_http=debug"
    } else {
        "mmt_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
