use serde::{Deserialize, Serialize};

/// Where a quote's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteSource {
	/// Fetched from the feed during this call.
	Live,
	/// Served from the cache within its time-to-live.
	Cache,
	/// The feed failed and an expired cache entry was returned instead.
	StaleCache,
	/// No price could be produced.
	Unavailable,
}

/// USD price for one token as reported by the oracle.
///
/// The price is `None` exactly when the quote is unavailable, so a caller
/// cannot read a number out of a quote that has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
	/// Normalized symbol the quote was resolved for.
	pub symbol: String,
	pub price_usd: Option<f64>,
	pub confidence: Option<f64>,
	/// Feed publish time, unix seconds.
	pub publish_time: Option<i64>,
	pub stale: bool,
	pub source: QuoteSource,
}

impl PriceQuote {
	pub fn unavailable(symbol: impl Into<String>) -> Self {
		Self {
			symbol: symbol.into(),
			price_usd: None,
			confidence: None,
			publish_time: None,
			stale: false,
			source: QuoteSource::Unavailable,
		}
	}

	pub fn is_available(&self) -> bool {
		self.source != QuoteSource::Unavailable && self.price_usd.is_some()
	}

	/// Returns the price only when the quote is available.
	pub fn usable_price(&self) -> Option<f64> {
		if self.is_available() {
			self.price_usd
		} else {
			None
		}
	}
}

/// Snapshot of the oracle cache for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleHealth {
	/// Number of symbols with a feed mapping.
	pub total_feeds: usize,
	/// Symbols holding a cached price.
	pub cached_feeds: usize,
	/// Cached entries still inside the time-to-live window.
	pub fresh_feeds: usize,
	/// Cached entries past the time-to-live window.
	pub stale_feeds: usize,
	pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unavailable_quote_has_no_price() {
		let quote = PriceQuote::unavailable("DOGE");
		assert!(!quote.is_available());
		assert_eq!(quote.usable_price(), None);
	}

	#[test]
	fn test_source_serializes_kebab_case() {
		let json = serde_json::to_string(&QuoteSource::StaleCache).unwrap();
		assert_eq!(json, "\"stale-cache\"");
	}
}
