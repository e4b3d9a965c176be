//! Read-through access that falls back to the cache when offline.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::Connectivity;
use crate::error::FieldlogError;

use super::manager::CacheManager;

/// Where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    /// Fetched from the remote store just now
    Network,
    /// Served from the local cache
    Offline,
}

/// A read result tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedRead<T> {
    /// The decoded result
    pub data: T,
    /// Whether `data` came from the network or the cache
    pub source: CacheSource,
    /// When the snapshot was written, for offline results
    pub cached_at: Option<DateTime<Utc>>,
    /// Whether an offline result is older than the layer's threshold
    pub stale: bool,
}

impl<T> CachedRead<T> {
    const fn network(data: T) -> Self {
        Self {
            data,
            source: CacheSource::Network,
            cached_at: None,
            stale: false,
        }
    }

    /// Whether the result came from the cache.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self.source, CacheSource::Offline)
    }
}

/// Network-first reads over a [`CacheManager`].
///
/// Online, a successful fetch refreshes the snapshot. When offline or when
/// the fetch fails, the last snapshot is served instead.
#[derive(Debug, Clone)]
pub struct CacheLayer {
    cache: CacheManager,
    stale_after: Duration,
}

impl CacheLayer {
    /// Wrap `cache`, flagging offline results older than 60 minutes as stale.
    #[must_use]
    pub fn new(cache: CacheManager) -> Self {
        Self {
            cache,
            stale_after: Duration::minutes(60),
        }
    }

    /// Set the age after which offline results are flagged stale.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// The underlying snapshot store.
    #[must_use]
    pub const fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Read `key`, preferring the remote store.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if it fails with nothing cached, `Remote` if
    /// offline with nothing cached, or a cache error if the snapshot cannot
    /// be read.
    pub fn read<T, F>(
        &self,
        key: &str,
        connectivity: Connectivity,
        fetch: F,
    ) -> Result<CachedRead<T>, FieldlogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, FieldlogError>,
    {
        if !connectivity.is_online() {
            return self.fallback(key, None);
        }

        match fetch() {
            Ok(data) => {
                // The fresh result is still good if the snapshot write fails
                if let Err(e) = self.cache.put(key, &data) {
                    warn!(key, error = %e, "Failed to refresh cache snapshot");
                }
                Ok(CachedRead::network(data))
            }
            Err(e) => {
                warn!(key, error = %e, "Fetch failed, falling back to cache");
                self.fallback(key, Some(e))
            }
        }
    }

    fn fallback<T: DeserializeOwned>(
        &self,
        key: &str,
        fetch_error: Option<FieldlogError>,
    ) -> Result<CachedRead<T>, FieldlogError> {
        let Some(entry) = self.cache.entry(key)? else {
            return Err(fetch_error.unwrap_or_else(|| {
                FieldlogError::Remote(format!("Offline and nothing cached for {key}"))
            }));
        };

        let stale = entry.is_stale(self.stale_after);
        let cached_at = entry.cached_at();
        debug!(key, stale, "Serving cached snapshot");

        let data = serde_json::from_value(entry.data).map_err(|e| {
            FieldlogError::operation(format!("Failed to decode cache entry {key}"), e)
        })?;

        Ok(CachedRead {
            data,
            source: CacheSource::Offline,
            cached_at: Some(cached_at),
            stale,
        })
    }
}
