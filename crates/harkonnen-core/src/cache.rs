//! In-memory caching of fetched price series.
//!
//! Posts in one batch frequently mention the same ticker at nearby times, and
//! reruns over the same export repeat every request. [`CachedMarketData`]
//! wraps any [`MarketDataClient`] and memoizes series by their exact
//! [`HistoryRequest`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{HistoryFuture, HistoryRequest, MarketDataClient, PriceSeries, ProviderId};

/// How the cache participates in a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a live entry when present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then overwrite the stored entry.
    Refresh,
    /// Always fetch and leave the cache untouched.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: PriceSeries,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<HistoryRequest, CacheEntry>,
    ttl: Duration,
}

impl CacheInner {
    fn get(&self, key: &HistoryRequest) -> Option<PriceSeries> {
        self.map
            .get(key)
            .filter(|entry| Instant::now() <= entry.expires_at)
            .map(|entry| entry.series.clone())
    }

    fn put(&mut self, key: HistoryRequest, series: PriceSeries) {
        let expires_at = Instant::now() + self.ttl;
        self.map.insert(key, CacheEntry { series, expires_at });
    }
}

/// Market data client decorator that memoizes successful fetches.
///
/// Errors are never cached. Empty series are, since an unknown ticker stays
/// unknown for the lifetime of a run.
pub struct CachedMarketData<C> {
    inner: C,
    mode: CacheMode,
    store: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl<C: MarketDataClient> CachedMarketData<C> {
    pub fn new(inner: C, ttl: Duration) -> Self {
        Self {
            inner,
            mode: CacheMode::Use,
            store: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// Wraps `inner` with a 15 minute TTL.
    pub fn with_default_ttl(inner: C) -> Self {
        Self::new(inner, Duration::from_secs(900))
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.store
            .write()
            .await
            .map
            .retain(|_, entry| entry.expires_at > now);
    }

    pub async fn clear(&self) {
        self.store.write().await.map.clear();
    }
}

impl<C: MarketDataClient> MarketDataClient for CachedMarketData<C> {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            if self.mode == CacheMode::Use {
                if let Some(series) = self.store.read().await.get(&req) {
                    tracing::debug!(symbol = %req.symbol, "price series served from cache");
                    return Ok(series);
                }
            }

            let series = self.inner.fetch_history(req.clone()).await?;
            if self.mode != CacheMode::Bypass {
                self.store.write().await.put(req, series.clone());
            }
            Ok(series)
        })
    }
}
