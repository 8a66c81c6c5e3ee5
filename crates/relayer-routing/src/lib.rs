//! Route selection for swap intents.
//!
//! Routes come from an external planning service when one is configured
//! and reachable. Otherwise a single conservative route is synthesized
//! from the [`RouteCatalog`] so execution can still be attempted.

use async_trait::async_trait;
use relayer_types::{
	Address, ChainId, FeeMode, ResolvedIntent, RouteCandidate, RouteStep, RouteType, StepType,
	U256,
};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod catalog;
pub mod implementations;

pub use catalog::{ChainRoutes, RouteCatalog};

/// Gas assumed for a synthesized same-chain swap.
pub const FALLBACK_SWAP_GAS: u64 = 150_000;
/// Gas assumed for a synthesized bridge step.
pub const FALLBACK_BRIDGE_GAS: u64 = 200_000;
/// Score of a synthesized route; live scores are clamped to zero or above.
pub const FALLBACK_SCORE: f64 = -1.0;

#[derive(Debug, Error)]
pub enum RoutingError {
	#[error("HTTP error: {0}")]
	Http(String),
	#[error("Invalid planner response: {0}")]
	InvalidResponse(String),
	#[error("Planner timed out after {0:?}")]
	Timeout(Duration),
	#[error("No {kind} adapter configured for chain {chain_id}")]
	NoAdapter { chain_id: ChainId, kind: &'static str },
}

/// Body sent to the planning service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
	pub user: Address,
	pub token_in: Address,
	#[serde(serialize_with = "decimal_string")]
	pub amt_in: U256,
	pub token_out: Address,
	#[serde(serialize_with = "decimal_string")]
	pub min_out: U256,
	pub src_chain_id: u64,
	pub dst_chain_id: u64,
	pub fee_mode: FeeMode,
	pub deadline: u64,
}

fn decimal_string<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&value.to_string())
}

impl From<&ResolvedIntent> for PlanRequest {
	fn from(resolved: &ResolvedIntent) -> Self {
		Self {
			user: resolved.intent.user,
			token_in: resolved.token_in.address,
			amt_in: resolved.amount_in,
			token_out: resolved.token_out.address,
			min_out: resolved.min_amount_out,
			src_chain_id: resolved.intent.source_chain_id.0,
			dst_chain_id: resolved.intent.destination_chain_id.0,
			fee_mode: resolved.intent.fee_mode,
			deadline: resolved.intent.deadline,
		}
	}
}

/// External route planning service.
#[async_trait]
pub trait PlannerInterface: Send + Sync {
	/// Returns candidates best-first.
	async fn plan(&self, request: &PlanRequest) -> Result<Vec<RouteCandidate>, RoutingError>;
}

/// Produces ordered route candidates for an intent.
pub struct RoutePlanner {
	planner: Option<Box<dyn PlannerInterface>>,
	catalog: Arc<RouteCatalog>,
	timeout: Duration,
}

impl RoutePlanner {
	pub fn new(
		planner: Option<Box<dyn PlannerInterface>>,
		catalog: Arc<RouteCatalog>,
		timeout: Duration,
	) -> Self {
		Self {
			planner,
			catalog,
			timeout,
		}
	}

	pub fn catalog(&self) -> &Arc<RouteCatalog> {
		&self.catalog
	}

	/// Returns candidates best-first.
	///
	/// Live planner results are returned in the planner's order. Any planner
	/// failure yields exactly one fallback candidate instead. The list is
	/// empty only when the planner answered with no routes; a catalog built
	/// from validated configuration has a fallback for every chain pair.
	pub async fn plan_routes(&self, intent: &ResolvedIntent) -> Vec<RouteCandidate> {
		match self.plan_live(intent).await {
			Ok(Some(routes)) => {
				info!(count = routes.len(), "Planner returned routes");
				return routes;
			}
			Ok(None) => debug!("No route planner configured, using fallback route"),
			Err(e) => warn!(error = %e, "Route planner unavailable, using fallback route"),
		}

		match self.fallback_route(intent) {
			Ok(route) => vec![route],
			Err(e) => {
				error!(error = %e, "Unable to build fallback route");
				Vec::new()
			}
		}
	}

	/// First candidate of [`plan_routes`](Self::plan_routes).
	pub async fn get_best_route(&self, intent: &ResolvedIntent) -> Option<RouteCandidate> {
		self.plan_routes(intent).await.into_iter().next()
	}

	async fn plan_live(
		&self,
		intent: &ResolvedIntent,
	) -> Result<Option<Vec<RouteCandidate>>, RoutingError> {
		let Some(planner) = &self.planner else {
			return Ok(None);
		};

		let request = PlanRequest::from(intent);
		let routes = tokio::time::timeout(self.timeout, planner.plan(&request))
			.await
			.map_err(|_| RoutingError::Timeout(self.timeout))??;

		if routes.is_empty() {
			return Ok(Some(routes));
		}

		let total = routes.len();
		let accepted: Vec<RouteCandidate> = routes
			.into_iter()
			.filter(|route| {
				let valid = route
					.last_step()
					.map(|step| step.token_out == intent.token_out.address)
					.unwrap_or(false);
				if !valid {
					warn!(route_id = %route.route_id, "Discarding malformed planner route");
				}
				valid
			})
			.map(|mut route| {
				route.score = if route.score.is_finite() {
					route.score.max(0.0)
				} else {
					0.0
				};
				route
			})
			.collect();

		if accepted.is_empty() {
			return Err(RoutingError::InvalidResponse(format!(
				"none of {} routes end in the requested output token",
				total
			)));
		}

		Ok(Some(accepted))
	}

	/// Single-step route built from static configuration.
	///
	/// Expected output is the intent's own minimum, a floor rather than a
	/// quote.
	pub fn fallback_route(&self, intent: &ResolvedIntent) -> Result<RouteCandidate, RoutingError> {
		let source = intent.intent.source_chain_id;
		let destination = intent.intent.destination_chain_id;

		let (route_id, route_type, step_type, protocol, adapter, gas, explanation) =
			if source == destination {
				let (protocol, adapter) =
					self.catalog
						.default_swap(source)
						.ok_or(RoutingError::NoAdapter {
							chain_id: source,
							kind: "swap",
						})?;
				let explanation = format!(
					"Fallback route: direct swap via {} on chain {}; expected output is the intent minimum, not a quote",
					protocol, source
				);
				(
					format!("fallback-{}-same-chain", source),
					RouteType::SameChain,
					StepType::Swap,
					protocol,
					adapter,
					FALLBACK_SWAP_GAS,
					explanation,
				)
			} else {
				let (protocol, adapter) =
					self.catalog
						.default_bridge(source)
						.ok_or(RoutingError::NoAdapter {
							chain_id: source,
							kind: "bridge",
						})?;
				let explanation = format!(
					"Fallback route: bridge via {} from chain {} to chain {}; cross-chain delivery is unconfirmed and best-effort",
					protocol, source, destination
				);
				(
					format!("fallback-bridge-{}-{}", source, destination),
					RouteType::CrossChain,
					StepType::Bridge,
					protocol,
					adapter,
					FALLBACK_BRIDGE_GAS,
					explanation,
				)
			};

		Ok(RouteCandidate {
			route_id,
			route_type,
			source_chain_id: source,
			destination_chain_id: destination,
			token_in: intent.token_in.address,
			token_out: intent.token_out.address,
			amount_in: intent.amount_in,
			steps: vec![RouteStep {
				step_type,
				protocol,
				adapter,
				token_in: intent.token_in.address,
				token_out: intent.token_out.address,
				chain_id: source,
				estimated_gas: gas,
			}],
			expected_out: intent.min_amount_out,
			total_gas_cost: U256::ZERO,
			protocol_fee: U256::ZERO,
			net_user_output: intent.min_amount_out,
			score: FALLBACK_SCORE,
			explanation,
		})
	}
}
