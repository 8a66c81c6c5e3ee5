//! Symbol normalization and the feed id table.

use relayer_config::OracleConfig;
use std::collections::HashMap;

/// Pyth mainnet price feed ids, keyed by canonical symbol.
const DEFAULT_FEEDS: &[(&str, &str)] = &[
	("ETH", "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace"),
	("POL", "ffd11c5a1cfd42f80afb2df4d9f264c15f956d68153335374ec10722edd70472"),
	("BTC", "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43"),
	("USDC", "eaa020c61cc479712813461ce153894a96a6c00b21ed0cfc2798d1f9a9e9c94a"),
	("USDT", "2b89b9dc8fdf9f34709a5b106b472f0f39bb6ca9ce04b0fd7f2e971688e2e53b"),
	("DAI", "b0948a5e5313200c632b51bb5ca32f6de0d36e9950a942d19751e833f70dabfd"),
	("LINK", "8ac0c70fff57e9aefdf5edf44b51d62c2d433653cbb2cf5cc06bb115af04d221"),
	("ARB", "3fa4252848f9f0a1480be62745a4629d9eb1322aebab8a791e344b3b9c1adcf5"),
	("OP", "385f64d993f7b77d8182ed5003d97c60aa3361f3cecfe711544d2d59165e9bdf"),
	("AVAX", "93da3352f9f1d105fdfe4971cfa80e9dd777bfc5d0f683ebb6e1294b92137bb7"),
	("BNB", "2f95862b045670cd22bee3114c39763a4a08beeb663b145d283c31d7d1101c4f"),
	("STRK", "6a182399ff70ccf3e06024898942028204125a819e519a335ffa4579e66cd870"),
];

/// Wrapped and rebranded symbols that share a feed with their underlying asset.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
	("WETH", "ETH"),
	("WPOL", "POL"),
	("WMATIC", "POL"),
	("MATIC", "POL"),
	("WBTC", "BTC"),
];

/// Lowercase hex without the `0x` prefix, the form the feed reports ids in.
pub fn normalize_feed_id(id: &str) -> String {
	let trimmed = id.trim();
	trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
		.unwrap_or(trimmed)
		.to_ascii_lowercase()
}

/// Maps token symbols to the feed that prices them.
#[derive(Debug, Clone)]
pub struct FeedTable {
	feeds: HashMap<String, String>,
	aliases: HashMap<String, String>,
}

impl Default for FeedTable {
	fn default() -> Self {
		Self {
			feeds: DEFAULT_FEEDS
				.iter()
				.map(|(symbol, id)| (symbol.to_string(), id.to_string()))
				.collect(),
			aliases: DEFAULT_ALIASES
				.iter()
				.map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
				.collect(),
		}
	}
}

impl FeedTable {
	/// An empty table with no feeds or aliases.
	pub fn empty() -> Self {
		Self {
			feeds: HashMap::new(),
			aliases: HashMap::new(),
		}
	}

	/// Default table extended with the configured overrides.
	pub fn from_config(config: &OracleConfig) -> Self {
		let mut table = Self::default();
		for (symbol, id) in &config.feeds {
			table = table.with_feed(symbol, id);
		}
		for (alias, canonical) in &config.aliases {
			table = table.with_alias(alias, canonical);
		}
		table
	}

	pub fn with_feed(mut self, symbol: &str, feed_id: &str) -> Self {
		self.feeds
			.insert(symbol.trim().to_uppercase(), normalize_feed_id(feed_id));
		self
	}

	pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
		self.aliases
			.insert(alias.trim().to_uppercase(), canonical.trim().to_uppercase());
		self
	}

	/// Upper-cases the symbol and collapses aliases onto their canonical asset.
	pub fn normalize(&self, symbol: &str) -> String {
		let upper = symbol.trim().to_uppercase();
		match self.aliases.get(&upper) {
			Some(canonical) => canonical.clone(),
			None => upper,
		}
	}

	/// Feed id for an already normalized symbol.
	pub fn feed_id(&self, normalized: &str) -> Option<&str> {
		self.feeds.get(normalized).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.feeds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.feeds.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wrapped_tokens_share_feed() {
		let table = FeedTable::default();
		assert_eq!(table.normalize("weth"), "ETH");
		assert_eq!(table.normalize("WMATIC"), "POL");
		assert_eq!(table.normalize("MATIC"), "POL");
		assert_eq!(table.normalize("wbtc"), "BTC");
		assert_eq!(table.feed_id(&table.normalize("WETH")), table.feed_id("ETH"));
	}

	#[test]
	fn test_unknown_symbol_has_no_feed() {
		let table = FeedTable::default();
		assert_eq!(table.normalize("doge"), "DOGE");
		assert!(table.feed_id("DOGE").is_none());
	}

	#[test]
	fn test_overrides_from_config() {
		let mut config = OracleConfig::default();
		config.feeds.insert("tka".to_string(), "0xABCDEF".to_string());
		config.aliases.insert("wtka".to_string(), "tka".to_string());
		let table = FeedTable::from_config(&config);
		assert_eq!(table.normalize("WTKA"), "TKA");
		assert_eq!(table.feed_id("TKA"), Some("abcdef"));
		assert_eq!(table.len(), DEFAULT_FEEDS.len() + 1);
	}
}
