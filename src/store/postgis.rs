use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use super::{LayerQuery, SpatialStore};
use crate::error::{StoreError, TileError};

/// Connection settings for [`PostgisStore`].
#[derive(Debug, Clone)]
pub struct PostgisStoreConfig {
    pub database_url: String,
    pub pool_size: u32,
    /// How long to wait for a free pooled connection
    pub acquire_timeout: Duration,
}

/// PostGIS-backed store.
///
/// Clipping and encoding run inside the database through `ST_AsMVTGeom` and
/// `ST_AsMVT`; each layer query returns a ready layer buffer.
#[derive(Clone)]
pub struct PostgisStore {
    pool: PgPool,
}

impl PostgisStore {
    /// Create the connection pool.
    ///
    /// Connections are opened on first use, so an unreachable database is
    /// reported per request rather than at startup.
    pub fn connect_lazy(config: &PostgisStoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(&config.database_url)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SpatialStore for PostgisStore {
    async fn layer_tile(&self, query: &LayerQuery) -> Result<Bytes, TileError> {
        let layer = query.layer();
        let sql = query.sql();
        let [xmin, ymin, xmax, ymax, seg_size] = query.params();

        let data: Option<Vec<u8>> = sqlx::query_scalar(&sql)
            .bind(xmin)
            .bind(ymin)
            .bind(xmax)
            .bind(ymax)
            .bind(seg_size)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(layer.name(), e))?;

        let data = data.unwrap_or_default();
        debug!(layer = layer.name(), bytes = data.len(), "Layer query complete");
        Ok(Bytes::from(data))
    }
}

fn map_sqlx_error(layer: &'static str, err: sqlx::Error) -> TileError {
    let store_error = match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query {
            layer,
            message: other.to_string(),
        },
    };
    TileError::Store(store_error)
}
