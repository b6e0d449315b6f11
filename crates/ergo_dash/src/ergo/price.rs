//! ERG/USD price from the oracle pool feed, cached for a fixed window.

use crate::chain::fetch::{FetchError, Fetcher};
use crate::chain::{NormalizeError, PriceCache, PriceSnapshot};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Returned when no price has ever been fetched.
pub const DEFAULT_PRICE: f64 = 1.0;

/// Decoded oracle quote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: f64,
    pub title: Option<String>,
    pub block_height: Option<u64>,
}

impl PriceQuote {
    /// Extract the quote from a decoded feed object. `latest_price` must be a
    /// positive number.
    pub fn from_feed(feed: &serde_json::Value) -> Result<Self, NormalizeError> {
        let price = feed
            .get("latest_price")
            .and_then(serde_json::Value::as_f64)
            .ok_or(NormalizeError::MissingField("latest_price"))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(NormalizeError::InvalidPrice(price));
        }
        Ok(Self {
            price,
            title: feed
                .get("title")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            block_height: feed
                .get("current_block_height")
                .and_then(serde_json::Value::as_u64),
        })
    }
}

/// Where fresh quotes come from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_quote(&self) -> Result<PriceQuote, FetchError>;
}

/// The oracle pool frontend feed.
pub struct OraclePriceSource {
    fetcher: Arc<Fetcher>,
}

impl OraclePriceSource {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl PriceSource for OraclePriceSource {
    async fn fetch_quote(&self) -> Result<PriceQuote, FetchError> {
        let feed = self.fetcher.price_feed().await?;
        Ok(PriceQuote::from_feed(&feed)?)
    }
}

/// Cached price lookups. At most one upstream call per window.
pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
    cache: PriceCache,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>, window: Duration) -> Self {
        Self {
            source,
            cache: PriceCache::new(window),
        }
    }

    /// Current price; never fails. A refreshed price is timestamped when the
    /// upstream answers, not when the request started.
    pub async fn get_price(&self) -> f64 {
        let mut slot = self.cache.lock().await;
        if let Some(snap) = *slot {
            if !snap.is_stale(Instant::now(), self.cache.window()) {
                debug!(price = snap.price, "price cache hit");
                return snap.price;
            }
        }
        match self.source.fetch_quote().await {
            Ok(quote) => {
                info!(price = quote.price, "price refreshed");
                *slot = Some(PriceSnapshot {
                    price: quote.price,
                    captured_at: Instant::now(),
                });
                quote.price
            }
            Err(e) => {
                let fallback = slot.as_ref().map_or(DEFAULT_PRICE, |s| s.price);
                warn!(error = %e, fallback, "price fetch failed");
                fallback
            }
        }
    }

    /// Last stored snapshot, if any.
    pub async fn snapshot(&self) -> Option<PriceSnapshot> {
        self.cache.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted results and counts calls. Each call takes `delay`.
    struct ScriptedSource {
        results: Mutex<Vec<Result<f64, u16>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<f64, u16>>) -> Arc<Self> {
            Self::slow(results, Duration::ZERO)
        }

        fn slow(mut results: Vec<Result<f64, u16>>, delay: Duration) -> Arc<Self> {
            results.reverse();
            Arc::new(Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        async fn fetch_quote(&self) -> Result<PriceQuote, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.results.lock().unwrap().pop().unwrap_or(Err(503));
            next.map(|price| PriceQuote {
                price,
                title: None,
                block_height: None,
            })
            .map_err(|status| FetchError::Api(status, "scripted".into()))
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn cached_within_window_refreshed_after() {
        let source = ScriptedSource::new(vec![Ok(1.10), Ok(1.20)]);
        let fetcher = PriceFetcher::new(source.clone(), secs(300));
        let start = Instant::now();

        assert_eq!(fetcher.get_price().await, 1.10);
        tokio::time::advance(secs(120)).await;
        assert_eq!(fetcher.get_price().await, 1.10);
        assert_eq!(source.calls(), 1);

        tokio::time::advance(secs(181)).await;
        assert_eq!(fetcher.get_price().await, 1.20);
        assert_eq!(source.calls(), 2);
        let snap = fetcher.snapshot().await.unwrap();
        assert_eq!(snap.captured_at, start + secs(301));
    }

    #[tokio::test(start_paused = true)]
    async fn window_starts_when_upstream_answers() {
        let source = ScriptedSource::slow(vec![Ok(1.5), Ok(9.9)], secs(8));
        let fetcher = PriceFetcher::new(source.clone(), secs(300));
        let start = Instant::now();

        assert_eq!(fetcher.get_price().await, 1.5);
        let snap = fetcher.snapshot().await.unwrap();
        assert_eq!(snap.captured_at, start + secs(8));

        // 303 s after the request began, 295 s after the answer
        tokio::time::advance(secs(295)).await;
        assert_eq!(fetcher.get_price().await, 1.5);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_cache_returns_default() {
        let source = ScriptedSource::new(vec![Err(500)]);
        let fetcher = PriceFetcher::new(source.clone(), secs(300));
        assert_eq!(fetcher.get_price().await, DEFAULT_PRICE);
        assert!(fetcher.snapshot().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_with_stale_cache_returns_last_price() {
        let source = ScriptedSource::new(vec![Ok(0.85), Err(502)]);
        let fetcher = PriceFetcher::new(source.clone(), secs(300));
        let start = Instant::now();
        assert_eq!(fetcher.get_price().await, 0.85);
        tokio::time::advance(secs(900)).await;
        assert_eq!(fetcher.get_price().await, 0.85);
        assert_eq!(source.calls(), 2);
        // the stale snapshot is kept as-is
        assert_eq!(fetcher.snapshot().await.unwrap().captured_at, start);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh() {
        let source = ScriptedSource::slow(vec![Ok(2.0)], secs(1));
        let fetcher = Arc::new(PriceFetcher::new(source.clone(), secs(300)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = fetcher.clone();
                tokio::spawn(async move { f.get_price().await })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap(), 2.0);
        }
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn quote_from_feed() {
        let q = PriceQuote::from_feed(&json!({
            "latest_price": 1.4321,
            "title": "ERG/USD",
            "current_block_height": 1_250_000
        }))
        .unwrap();
        assert_eq!(q.price, 1.4321);
        assert_eq!(q.title.as_deref(), Some("ERG/USD"));
        assert_eq!(q.block_height, Some(1_250_000));
    }

    #[test]
    fn quote_requires_positive_price() {
        assert!(matches!(
            PriceQuote::from_feed(&json!({"title": "x"})),
            Err(NormalizeError::MissingField("latest_price"))
        ));
        assert!(matches!(
            PriceQuote::from_feed(&json!({"latest_price": null})),
            Err(NormalizeError::MissingField(_))
        ));
        assert!(matches!(
            PriceQuote::from_feed(&json!({"latest_price": 0})),
            Err(NormalizeError::InvalidPrice(_))
        ));
    }
}
