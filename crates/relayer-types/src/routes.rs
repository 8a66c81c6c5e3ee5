use crate::{Address, ChainId, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteType {
	SameChain,
	CrossChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
	Swap,
	Bridge,
}

/// One leg of a route, executed by a single adapter contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
	pub step_type: StepType,
	pub protocol: String,
	pub adapter: Address,
	pub token_in: Address,
	pub token_out: Address,
	pub chain_id: ChainId,
	pub estimated_gas: u64,
}

/// A scored way of executing an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCandidate {
	pub route_id: String,
	pub route_type: RouteType,
	pub source_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	pub token_in: Address,
	pub token_out: Address,
	pub amount_in: U256,
	pub steps: Vec<RouteStep>,
	pub expected_out: U256,
	pub total_gas_cost: U256,
	pub protocol_fee: U256,
	pub net_user_output: U256,
	pub score: f64,
	pub explanation: String,
}

impl RouteCandidate {
	pub fn first_step(&self) -> Option<&RouteStep> {
		self.steps.first()
	}

	pub fn last_step(&self) -> Option<&RouteStep> {
		self.steps.last()
	}

	/// Routes synthesized locally when the planner was unreachable.
	pub fn is_fallback(&self) -> bool {
		self.explanation.to_ascii_lowercase().contains("fallback")
	}

	pub fn total_estimated_gas(&self) -> u64 {
		self.steps
			.iter()
			.fold(0u64, |acc, step| acc.saturating_add(step.estimated_gas))
	}
}
