//! Runtime-adjustable settings.
//!
//! The cache TTL is read on every tile request through [`TtlSource`], so it
//! can change while the server runs. [`RuntimeSettings`] holds the value in
//! an atomic; [`spawn_settings_reloader`] keeps it in sync with a small JSON
//! file:
//!
//! ```json
//! { "cache_ttl": 300 }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::SettingsError;

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Supplies the cache TTL for the current request.
pub trait TtlSource: Send + Sync {
    fn cache_ttl(&self) -> Duration;
}

/// A fixed TTL.
impl TtlSource for Duration {
    fn cache_ttl(&self) -> Duration {
        *self
    }
}

/// Shared, live-updatable settings.
///
/// Clones share the same underlying value.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    cache_ttl_secs: Arc<AtomicU64>,
}

impl RuntimeSettings {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache_ttl_secs: Arc::new(AtomicU64::new(cache_ttl.as_secs())),
        }
    }

    /// Replace the cache TTL. Whole seconds only; a zero TTL disables caching.
    pub fn set_cache_ttl(&self, ttl: Duration) {
        self.cache_ttl_secs.store(ttl.as_secs(), Ordering::Relaxed);
    }

    /// Load the settings file and apply it.
    ///
    /// Returns the TTL now in effect. On error the current value is kept.
    pub async fn reload_from_file(&self, path: &Path) -> Result<Duration, SettingsError> {
        let file = read_settings_file(path).await?;
        let ttl = Duration::from_secs(file.cache_ttl);
        self.set_cache_ttl(ttl);
        Ok(ttl)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }
}

impl TtlSource for RuntimeSettings {
    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    /// Seconds
    cache_ttl: u64,
}

async fn read_settings_file(path: &Path) -> Result<SettingsFile, SettingsError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_str(&contents).map_err(|e| SettingsError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Poll the settings file every `interval` and apply changes.
///
/// The first poll happens immediately. Failures are logged and leave the
/// previous settings in place.
pub fn spawn_settings_reloader(
    path: PathBuf,
    settings: RuntimeSettings,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let previous = settings.cache_ttl();
            match settings.reload_from_file(&path).await {
                Ok(ttl) if ttl != previous => {
                    info!(
                        path = %path.display(),
                        cache_ttl_secs = ttl.as_secs(),
                        "Cache TTL updated"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Keeping previous settings");
                }
            }
        }
    })
}
