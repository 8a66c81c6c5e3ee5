//! Route planner reached over HTTP.

use crate::{PlanRequest, PlannerInterface, RoutingError};
use async_trait::async_trait;
use relayer_config::PlannerConfig;
use relayer_types::{Address, ChainId, RouteCandidate, RouteStep, RouteType, StepType, U256};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// Client for `POST {url}/plan-routes`.
pub struct HttpPlanner {
	client: reqwest::Client,
	base_url: String,
}

impl HttpPlanner {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RoutingError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| RoutingError::Http(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
	routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRoute {
	route_id: String,
	#[serde(rename = "type")]
	route_type: RouteType,
	src_chain_id: ChainId,
	dst_chain_id: ChainId,
	token_in: Address,
	token_out: Address,
	#[serde(deserialize_with = "amount")]
	amount_in: U256,
	#[serde(deserialize_with = "amount")]
	expected_out: U256,
	steps: Vec<WireStep>,
	#[serde(default, deserialize_with = "amount")]
	total_gas_cost: U256,
	#[serde(default, rename = "pythFee", deserialize_with = "amount")]
	protocol_fee: U256,
	#[serde(default, deserialize_with = "amount")]
	net_user_output: U256,
	#[serde(default)]
	score: f64,
	#[serde(default)]
	explain: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStep {
	#[serde(rename = "type")]
	step_type: StepType,
	protocol: String,
	adapter_address: Address,
	token_in: Address,
	token_out: Address,
	chain_id: ChainId,
	#[serde(default)]
	estimated_gas: u64,
}

/// Accepts base-unit amounts as decimal strings, hex strings, or JSON integers.
fn amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(serde_json::Number),
	}

	let text = match Raw::deserialize(deserializer)? {
		Raw::Text(text) => text,
		Raw::Number(number) => number.to_string(),
	};
	text.trim()
		.parse::<U256>()
		.map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e)))
}

impl From<WireRoute> for RouteCandidate {
	fn from(route: WireRoute) -> Self {
		RouteCandidate {
			route_id: route.route_id,
			route_type: route.route_type,
			source_chain_id: route.src_chain_id,
			destination_chain_id: route.dst_chain_id,
			token_in: route.token_in,
			token_out: route.token_out,
			amount_in: route.amount_in,
			steps: route
				.steps
				.into_iter()
				.map(|step| RouteStep {
					step_type: step.step_type,
					protocol: step.protocol,
					adapter: step.adapter_address,
					token_in: step.token_in,
					token_out: step.token_out,
					chain_id: step.chain_id,
					estimated_gas: step.estimated_gas,
				})
				.collect(),
			expected_out: route.expected_out,
			total_gas_cost: route.total_gas_cost,
			protocol_fee: route.protocol_fee,
			net_user_output: route.net_user_output,
			score: route.score,
			explanation: route.explain,
		}
	}
}

#[async_trait]
impl PlannerInterface for HttpPlanner {
	async fn plan(&self, request: &PlanRequest) -> Result<Vec<RouteCandidate>, RoutingError> {
		let url = format!("{}/plan-routes", self.base_url);
		debug!(url = %url, "Requesting routes from planner");

		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| RoutingError::Http(e.to_string()))?;

		if !response.status().is_success() {
			return Err(RoutingError::Http(format!(
				"Planner returned status {}",
				response.status()
			)));
		}

		let body: PlanResponse = response
			.json()
			.await
			.map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

		Ok(body.routes.into_iter().map(RouteCandidate::from).collect())
	}
}

/// Builds the HTTP planner if a planner URL is configured.
pub fn create_planner(
	config: &PlannerConfig,
) -> Result<Option<Box<dyn PlannerInterface>>, RoutingError> {
	match &config.url {
		Some(url) => Ok(Some(Box::new(HttpPlanner::new(
			url,
			Duration::from_secs(config.timeout_secs),
		)?))),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relayer_types::FeeMode;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn request() -> PlanRequest {
		PlanRequest {
			user: Address::repeat_byte(0x11),
			token_in: Address::repeat_byte(0xaa),
			amt_in: U256::from(1_000_000_000_000_000u64),
			token_out: Address::repeat_byte(0xbb),
			min_out: U256::from(6_000_000u64),
			src_chain_id: 1,
			dst_chain_id: 1,
			fee_mode: FeeMode::Input,
			deadline: 1_900_000_000,
		}
	}

	#[tokio::test]
	async fn test_maps_planner_routes() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/plan-routes"))
			.and(body_partial_json(serde_json::json!({
				"amtIn": "1000000000000000",
				"srcChainId": 1,
				"feeMode": "INPUT"
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"routes": [{
					"routeId": "r-1",
					"type": "same-chain",
					"srcChainId": 1,
					"dstChainId": 1,
					"tokenIn": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
					"tokenOut": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
					"amountIn": "1000000000000000",
					"expectedOut": 6240900,
					"steps": [{
						"type": "swap",
						"protocol": "uniswap",
						"adapterAddress": "0x2222222222222222222222222222222222222222",
						"tokenIn": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
						"tokenOut": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
						"chainId": 1,
						"estimatedGas": 140000
					}],
					"totalGasCost": "0x10",
					"pythFee": "1",
					"netUserOutput": "6240899",
					"score": 0.92,
					"explain": "Direct swap via uniswap"
				}]
			})))
			.mount(&server)
			.await;

		let planner = HttpPlanner::new(&server.uri(), Duration::from_secs(5)).unwrap();
		let routes = planner.plan(&request()).await.unwrap();

		assert_eq!(routes.len(), 1);
		let route = &routes[0];
		assert_eq!(route.route_type, RouteType::SameChain);
		assert_eq!(route.expected_out, U256::from(6_240_900u64));
		assert_eq!(route.total_gas_cost, U256::from(16u64));
		assert_eq!(route.steps[0].adapter, Address::repeat_byte(0x22));
		assert_eq!(route.steps[0].step_type, StepType::Swap);
	}

	#[tokio::test]
	async fn test_server_error_is_reported() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let planner = HttpPlanner::new(&server.uri(), Duration::from_secs(5)).unwrap();
		assert!(matches!(
			planner.plan(&request()).await,
			Err(RoutingError::Http(_))
		));
	}

	#[test]
	fn test_no_url_means_no_planner() {
		assert!(create_planner(&PlannerConfig::default()).unwrap().is_none());
	}
}
