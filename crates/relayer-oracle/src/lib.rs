//! Time-bounded, fail-closed USD price oracle.
//!
//! Prices are fetched from an external feed and cached per normalized
//! symbol for a short time-to-live. When the feed fails, the last known
//! price is served and flagged stale. When there is no last known price,
//! the quote is unavailable: this crate never invents a number.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use relayer_config::OracleConfig;
use relayer_types::{ChainId, OracleHealth, PriceQuote, QuoteSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub mod implementations;
pub mod symbols;

pub use symbols::FeedTable;

#[derive(Debug, Error)]
pub enum OracleError {
	#[error("HTTP error: {0}")]
	Http(String),
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Feed {0} missing from response")]
	MissingFeed(String),
	#[error("Feed {feed_id} reported unusable price {price}")]
	InvalidPrice { feed_id: String, price: i64 },
	#[error("Feed request timed out after {0:?}")]
	Timeout(Duration),
}

/// Raw feed reading: the price is `price * 10^expo` USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPrice {
	pub price: i64,
	pub conf: u64,
	pub expo: i32,
	/// Unix seconds.
	pub publish_time: i64,
}

impl FeedPrice {
	pub fn price_f64(&self) -> f64 {
		self.price as f64 * 10f64.powi(self.expo)
	}

	pub fn confidence_f64(&self) -> f64 {
		self.conf as f64 * 10f64.powi(self.expo)
	}
}

/// Source of raw price readings keyed by feed id.
#[async_trait]
pub trait FeedInterface: Send + Sync {
	/// Fetches the latest readings. Keys in the result are feed ids in
	/// lowercase hex without a `0x` prefix.
	async fn fetch_prices(
		&self,
		feed_ids: &[String],
	) -> Result<HashMap<String, FeedPrice>, OracleError>;
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
	price: f64,
	confidence: f64,
	publish_time: i64,
	fetched_at: Instant,
}

type CacheSlot = Arc<Mutex<Option<CacheEntry>>>;

/// USD price oracle with a per-symbol cache.
pub struct PriceOracleClient {
	feed: Box<dyn FeedInterface>,
	table: FeedTable,
	ttl: Duration,
	max_age_secs: i64,
	fetch_timeout: Duration,
	/// One slot per normalized symbol. The slot's lock is held across the
	/// freshness check and the fetch-then-store so a symbol is fetched at
	/// most once at a time.
	cache: DashMap<String, CacheSlot>,
}

impl PriceOracleClient {
	pub fn new(feed: Box<dyn FeedInterface>, table: FeedTable, config: &OracleConfig) -> Self {
		Self {
			feed,
			table,
			ttl: config.ttl(),
			max_age_secs: i64::try_from(config.max_age_secs).unwrap_or(i64::MAX),
			fetch_timeout: config.timeout(),
			cache: DashMap::new(),
		}
	}

	pub fn feed_table(&self) -> &FeedTable {
		&self.table
	}

	/// Returns a USD quote for `symbol`.
	///
	/// Never fails: every failure mode is reported through the quote's
	/// source and availability. Feeds are chain-agnostic, so `chain_id` is
	/// only used for diagnostics.
	pub async fn get_price(&self, symbol: &str, chain_id: ChainId) -> PriceQuote {
		let normalized = self.table.normalize(symbol);
		let Some(feed_id) = self.table.feed_id(&normalized).map(str::to_string) else {
			warn!(symbol = %normalized, chain_id = %chain_id, "No price feed configured");
			return PriceQuote::unavailable(normalized);
		};

		let slot = self.cache.entry(normalized.clone()).or_default().value().clone();
		let mut entry = slot.lock().await;

		if let Some(cached) = entry.as_ref() {
			if cached.fetched_at.elapsed() < self.ttl {
				debug!(symbol = %normalized, "Price cache hit");
				return self.quote_from(&normalized, cached, QuoteSource::Cache);
			}
		}

		match self.fetch(&feed_id).await {
			Ok(reading) => {
				let fresh = CacheEntry {
					price: reading.price_f64(),
					confidence: reading.confidence_f64(),
					publish_time: reading.publish_time,
					fetched_at: Instant::now(),
				};
				*entry = Some(fresh);
				let quote = self.quote_from(&normalized, &fresh, QuoteSource::Live);
				info!(
					symbol = %normalized,
					price = fresh.price,
					stale = quote.stale,
					"Fetched live price"
				);
				quote
			}
			Err(e) => match entry.as_ref() {
				Some(previous) => {
					warn!(symbol = %normalized, error = %e, "Price fetch failed, serving stale cache");
					let mut quote = self.quote_from(&normalized, previous, QuoteSource::StaleCache);
					quote.stale = true;
					quote
				}
				None => {
					error!(symbol = %normalized, error = %e, "Price fetch failed with no cached value");
					PriceQuote::unavailable(normalized)
				}
			},
		}
	}

	/// Quotes several symbols independently, keyed by the symbols as given.
	pub async fn get_prices(&self, symbols: &[String], chain_id: ChainId) -> HashMap<String, PriceQuote> {
		let quotes = join_all(symbols.iter().map(|symbol| self.get_price(symbol, chain_id))).await;
		symbols.iter().cloned().zip(quotes).collect()
	}

	/// Reports cache occupancy without fetching or evicting anything.
	pub async fn health_check(&self) -> OracleHealth {
		let slots: Vec<CacheSlot> = self.cache.iter().map(|slot| slot.value().clone()).collect();

		let mut cached_feeds = 0;
		let mut fresh_feeds = 0;
		for slot in slots {
			if let Some(entry) = slot.lock().await.as_ref() {
				cached_feeds += 1;
				if entry.fetched_at.elapsed() < self.ttl {
					fresh_feeds += 1;
				}
			}
		}

		OracleHealth {
			total_feeds: self.table.len(),
			cached_feeds,
			fresh_feeds,
			stale_feeds: cached_feeds - fresh_feeds,
			ttl_secs: self.ttl.as_secs(),
		}
	}

	async fn fetch(&self, feed_id: &str) -> Result<FeedPrice, OracleError> {
		let ids = [feed_id.to_string()];
		let readings = tokio::time::timeout(self.fetch_timeout, self.feed.fetch_prices(&ids))
			.await
			.map_err(|_| OracleError::Timeout(self.fetch_timeout))??;

		let reading = readings
			.get(feed_id)
			.copied()
			.ok_or_else(|| OracleError::MissingFeed(feed_id.to_string()))?;

		if reading.price <= 0 {
			return Err(OracleError::InvalidPrice {
				feed_id: feed_id.to_string(),
				price: reading.price,
			});
		}

		Ok(reading)
	}

	fn quote_from(&self, symbol: &str, entry: &CacheEntry, source: QuoteSource) -> PriceQuote {
		let age = chrono::Utc::now().timestamp() - entry.publish_time;
		PriceQuote {
			symbol: symbol.to_string(),
			price_usd: Some(entry.price),
			confidence: Some(entry.confidence),
			publish_time: Some(entry.publish_time),
			stale: age > self.max_age_secs,
			source,
		}
	}
}

/// Builds the oracle client from configuration using the Hermes feed.
pub fn create_oracle(config: &OracleConfig) -> Result<PriceOracleClient, OracleError> {
	let feed = implementations::hermes::create_feed(config)?;
	Ok(PriceOracleClient::new(feed, FeedTable::from_config(config), config))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::time::Duration;

	const TKA_FEED: &str = "aa";

	struct MockFeed {
		calls: Arc<AtomicUsize>,
		failing: Arc<AtomicBool>,
		price: i64,
		publish_time: i64,
		latency: Duration,
	}

	#[async_trait]
	impl FeedInterface for MockFeed {
		async fn fetch_prices(
			&self,
			feed_ids: &[String],
		) -> Result<HashMap<String, FeedPrice>, OracleError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if !self.latency.is_zero() {
				tokio::time::sleep(self.latency).await;
			}
			if self.failing.load(Ordering::SeqCst) {
				return Err(OracleError::Http("connection refused".to_string()));
			}
			Ok(feed_ids
				.iter()
				.map(|id| {
					(
						id.clone(),
						FeedPrice {
							price: self.price,
							conf: 100,
							expo: -2,
							publish_time: self.publish_time,
						},
					)
				})
				.collect())
		}
	}

	struct Harness {
		client: PriceOracleClient,
		calls: Arc<AtomicUsize>,
		failing: Arc<AtomicBool>,
	}

	fn harness(price: i64, publish_time: i64) -> Harness {
		harness_with_latency(price, publish_time, Duration::ZERO)
	}

	fn harness_with_latency(price: i64, publish_time: i64, latency: Duration) -> Harness {
		let calls = Arc::new(AtomicUsize::new(0));
		let failing = Arc::new(AtomicBool::new(false));
		let feed = MockFeed {
			calls: calls.clone(),
			failing: failing.clone(),
			price,
			publish_time,
			latency,
		};
		let table = FeedTable::empty()
			.with_feed("TKA", TKA_FEED)
			.with_alias("WTKA", "TKA");
		let client = PriceOracleClient::new(Box::new(feed), table, &OracleConfig::default());
		Harness {
			client,
			calls,
			failing,
		}
	}

	fn now() -> i64 {
		chrono::Utc::now().timestamp()
	}

	#[tokio::test(start_paused = true)]
	async fn test_concurrent_requests_share_one_fetch() {
		let h = harness_with_latency(345_000, now(), Duration::from_secs(1));

		let (first, second) = tokio::join!(
			h.client.get_price("TKA", ChainId(1)),
			h.client.get_price("TKA", ChainId(1))
		);

		assert_eq!(h.calls.load(Ordering::SeqCst), 1);
		assert_eq!(first.price_usd, second.price_usd);
		let mut sources = [first.source, second.source];
		sources.sort_by_key(|source| *source == QuoteSource::Cache);
		assert_eq!(sources, [QuoteSource::Live, QuoteSource::Cache]);
	}

	#[tokio::test]
	async fn test_unmapped_symbol_is_unavailable() {
		let h = harness(345_000, now());
		let quote = h.client.get_price("DOGE", ChainId(1)).await;
		assert!(!quote.is_available());
		assert_eq!(quote.price_usd, None);
		assert_eq!(quote.source, QuoteSource::Unavailable);
		assert_eq!(h.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_live_then_cache_within_ttl() {
		let h = harness(345_000, now());
		let first = h.client.get_price("TKA", ChainId(1)).await;
		assert_eq!(first.source, QuoteSource::Live);
		assert_eq!(first.price_usd, Some(3450.0));
		assert!(!first.stale);

		let second = h.client.get_price("wtka", ChainId(1)).await;
		assert_eq!(second.source, QuoteSource::Cache);
		assert_eq!(second.price_usd, first.price_usd);
		assert_eq!(h.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_expired_entry_is_refetched() {
		let h = harness(345_000, now());
		h.client.get_price("TKA", ChainId(1)).await;
		tokio::time::advance(Duration::from_secs(16)).await;

		let quote = h.client.get_price("TKA", ChainId(1)).await;
		assert_eq!(quote.source, QuoteSource::Live);
		assert_eq!(h.calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_fetch_failure_serves_stale_cache() {
		let h = harness(345_000, now());
		let first = h.client.get_price("TKA", ChainId(1)).await;
		tokio::time::advance(Duration::from_secs(30)).await;
		h.failing.store(true, Ordering::SeqCst);

		let quote = h.client.get_price("TKA", ChainId(1)).await;
		assert_eq!(quote.source, QuoteSource::StaleCache);
		assert!(quote.stale);
		assert!(quote.is_available());
		assert_eq!(quote.price_usd, first.price_usd);
	}

	#[tokio::test]
	async fn test_fetch_failure_without_cache_fails_closed() {
		let h = harness(345_000, now());
		h.failing.store(true, Ordering::SeqCst);

		let quote = h.client.get_price("TKA", ChainId(1)).await;
		assert!(!quote.is_available());
		assert_eq!(quote.usable_price(), None);
	}

	#[tokio::test]
	async fn test_old_publish_time_flags_stale_live_quote() {
		let h = harness(345_000, now() - 600);
		let quote = h.client.get_price("TKA", ChainId(1)).await;
		assert_eq!(quote.source, QuoteSource::Live);
		assert!(quote.stale);
		assert!(quote.is_available());
	}

	#[tokio::test]
	async fn test_non_positive_price_is_rejected() {
		let h = harness(-5, now());
		let quote = h.client.get_price("TKA", ChainId(1)).await;
		assert!(!quote.is_available());
	}

	#[tokio::test]
	async fn test_batch_reports_partial_availability() {
		let h = harness(345_000, now());
		let quotes = h
			.client
			.get_prices(&["TKA".to_string(), "DOGE".to_string()], ChainId(1))
			.await;
		assert!(quotes["TKA"].is_available());
		assert!(!quotes["DOGE"].is_available());
	}

	#[tokio::test(start_paused = true)]
	async fn test_health_check_counts_fresh_and_stale() {
		let h = harness(345_000, now());
		let empty = h.client.health_check().await;
		assert_eq!(empty.total_feeds, 1);
		assert_eq!(empty.cached_feeds, 0);

		h.client.get_price("TKA", ChainId(1)).await;
		let fresh = h.client.health_check().await;
		assert_eq!((fresh.cached_feeds, fresh.fresh_feeds, fresh.stale_feeds), (1, 1, 0));

		tokio::time::advance(Duration::from_secs(20)).await;
		let aged = h.client.health_check().await;
		assert_eq!((aged.cached_feeds, aged.fresh_feeds, aged.stale_feeds), (1, 0, 1));
		assert_eq!(h.calls.load(Ordering::SeqCst), 1);
	}
}
