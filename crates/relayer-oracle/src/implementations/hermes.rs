//! Price feed backed by the Pyth Hermes HTTP API.

use crate::symbols::normalize_feed_id;
use crate::{FeedInterface, FeedPrice, OracleError};
use async_trait::async_trait;
use relayer_config::OracleConfig;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

/// Client for `GET /v2/updates/price/latest`.
pub struct HermesFeed {
	client: reqwest::Client,
	base_url: String,
}

impl HermesFeed {
	pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, OracleError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| OracleError::Http(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[derive(Debug, Deserialize)]
struct LatestPriceResponse {
	#[serde(default)]
	parsed: Vec<ParsedPriceUpdate>,
}

#[derive(Debug, Deserialize)]
struct ParsedPriceUpdate {
	id: String,
	price: HermesPrice,
}

/// Hermes encodes 64-bit integers as JSON strings.
#[derive(Debug, Deserialize)]
struct HermesPrice {
	#[serde(deserialize_with = "number_or_string")]
	price: i64,
	#[serde(deserialize_with = "number_or_string")]
	conf: u64,
	expo: i32,
	publish_time: i64,
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr + Deserialize<'de>,
	T::Err: std::fmt::Display,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw<T> {
		Number(T),
		Text(String),
	}

	match Raw::<T>::deserialize(deserializer)? {
		Raw::Number(value) => Ok(value),
		Raw::Text(text) => text.parse::<T>().map_err(serde::de::Error::custom),
	}
}

#[async_trait]
impl FeedInterface for HermesFeed {
	async fn fetch_prices(
		&self,
		feed_ids: &[String],
	) -> Result<HashMap<String, FeedPrice>, OracleError> {
		let url = format!("{}/v2/updates/price/latest", self.base_url);
		let mut query: Vec<(&str, String)> = feed_ids
			.iter()
			.map(|id| ("ids[]", format!("0x{}", normalize_feed_id(id))))
			.collect();
		query.push(("parsed", "true".to_string()));

		debug!(feeds = feed_ids.len(), "Requesting Hermes price update");

		let response = self
			.client
			.get(&url)
			.query(&query)
			.send()
			.await
			.map_err(|e| OracleError::Http(e.to_string()))?;

		if !response.status().is_success() {
			return Err(OracleError::Http(format!(
				"Hermes returned status {}",
				response.status()
			)));
		}

		let body: LatestPriceResponse = response
			.json()
			.await
			.map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

		Ok(body
			.parsed
			.into_iter()
			.map(|update| {
				(
					normalize_feed_id(&update.id),
					FeedPrice {
						price: update.price.price,
						conf: update.price.conf,
						expo: update.price.expo,
						publish_time: update.price.publish_time,
					},
				)
			})
			.collect())
	}
}

/// Builds the Hermes feed described by the oracle configuration.
pub fn create_feed(config: &OracleConfig) -> Result<Box<dyn FeedInterface>, OracleError> {
	Ok(Box::new(HermesFeed::new(&config.base_url, config.timeout())?))
}
