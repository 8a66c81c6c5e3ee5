//! Deterministic calldata encoding for routes.
//!
//! The adapter's output must be delivered to the router, which forwards
//! it to the user. [`CallEncoder::encode_adapter_call`] refuses to encode
//! any other recipient.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use relayer_routing::RouteCatalog;
use relayer_types::{ChainId, ResolvedIntent, RouteCandidate, RouteStep};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub mod abi;
pub mod units;

pub use units::to_base_units;

#[derive(Debug, Error)]
pub enum EncodingError {
	#[error("Recipient {actual} is not the router {expected} for chain {chain_id}")]
	RecipientMismatch {
		chain_id: ChainId,
		expected: Address,
		actual: Address,
	},
	#[error("No router configured for chain {0}")]
	UnknownChain(ChainId),
	#[error("Route {0} has no steps")]
	EmptyRoute(String),
	#[error("Negative amount {0}")]
	NegativeAmount(String),
	#[error("Amount {amount} overflows with {decimals} decimals")]
	AmountOverflow { amount: String, decimals: u8 },
}

/// Calls produced for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRoute {
	pub router: Address,
	pub adapter: Address,
	/// `swap(...)` calldata for the adapter.
	pub adapter_call: Bytes,
	/// `executeRoute(...)` calldata for the router, wrapping `adapter_call`.
	pub router_call: Bytes,
}

pub struct CallEncoder {
	catalog: Arc<RouteCatalog>,
}

impl CallEncoder {
	pub fn new(catalog: Arc<RouteCatalog>) -> Self {
		Self { catalog }
	}

	/// Encodes `swap(tokenIn, tokenOut, amountIn, minAmountOut, recipient, deadline)`
	/// for the step's adapter.
	///
	/// Amounts must already be in base units of their own tokens.
	pub fn encode_adapter_call(
		&self,
		step: &RouteStep,
		amount_in: U256,
		min_amount_out: U256,
		recipient: Address,
		deadline: u64,
	) -> Result<Bytes, EncodingError> {
		let router = self
			.catalog
			.router(step.chain_id)
			.ok_or(EncodingError::UnknownChain(step.chain_id))?;

		if recipient != router {
			return Err(EncodingError::RecipientMismatch {
				chain_id: step.chain_id,
				expected: router,
				actual: recipient,
			});
		}

		let call = abi::ISwapAdapter::swapCall {
			tokenIn: step.token_in,
			tokenOut: step.token_out,
			amountIn: amount_in,
			minAmountOut: min_amount_out,
			recipient,
			deadline: U256::from(deadline),
		};

		Ok(call.abi_encode().into())
	}

	/// Encodes `executeRoute(intent, adapter, routeData)` for the router.
	pub fn encode_router_call(
		&self,
		intent: &ResolvedIntent,
		adapter: Address,
		route_data: Bytes,
	) -> Bytes {
		let tuple = abi::RouterIntent {
			user: intent.intent.user,
			tokenIn: intent.token_in.address,
			amtIn: intent.amount_in,
			tokenOut: intent.token_out.address,
			minOut: intent.min_amount_out,
			dstChainId: intent.intent.destination_chain_id.0,
			deadline: intent.intent.deadline,
			feeToken: intent.fee_token.address,
			feeMode: intent.intent.fee_mode.as_u8(),
			feeCapToken: intent.fee_cap,
			routeHint: Bytes::new(),
			nonce: U256::from(intent.intent.nonce),
		};

		abi::IRouterHub::executeRouteCall {
			intent: tuple,
			adapter,
			routeData: route_data,
		}
		.abi_encode()
		.into()
	}

	/// Encodes the first step of `route` with the router as recipient and
	/// wraps it in the router entry point call.
	pub fn encode_route(
		&self,
		intent: &ResolvedIntent,
		route: &RouteCandidate,
		recipient: Address,
	) -> Result<EncodedRoute, EncodingError> {
		let step = route
			.first_step()
			.ok_or_else(|| EncodingError::EmptyRoute(route.route_id.clone()))?;

		if !self.catalog.is_known_adapter(step.chain_id, step.adapter) {
			warn!(
				route_id = %route.route_id,
				adapter = %step.adapter,
				"Adapter is not in the local catalog; the router may reject it"
			);
		}

		let adapter_call = self.encode_adapter_call(
			step,
			intent.amount_in,
			intent.min_amount_out,
			recipient,
			intent.intent.deadline,
		)?;
		let router_call = self.encode_router_call(intent, step.adapter, adapter_call.clone());

		Ok(EncodedRoute {
			router: recipient,
			adapter: step.adapter,
			adapter_call,
			router_call,
		})
	}

	/// Encodes an ERC-20 `approve(spender, amount)` call.
	pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
		abi::IERC20::approveCall { spender, amount }.abi_encode().into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::keccak256;
	use alloy::sol_types::SolValue;
	use relayer_routing::ChainRoutes;
	use relayer_types::{FeeMode, Intent, RouteType, StepType, TokenInfo};
	use rust_decimal::Decimal;

	const ROUTER: Address = Address::repeat_byte(0x01);
	const ADAPTER: Address = Address::repeat_byte(0x02);

	fn encoder() -> CallEncoder {
		CallEncoder::new(Arc::new(RouteCatalog::new().with_chain(
			ChainId(1),
			ChainRoutes::new(ROUTER, "uniswap").with_adapter("uniswap", ADAPTER),
		)))
	}

	fn step() -> RouteStep {
		RouteStep {
			step_type: StepType::Swap,
			protocol: "uniswap".to_string(),
			adapter: ADAPTER,
			token_in: Address::repeat_byte(0xaa),
			token_out: Address::repeat_byte(0xbb),
			chain_id: ChainId(1),
			estimated_gas: 150_000,
		}
	}

	fn resolved() -> ResolvedIntent {
		let token = |byte: u8, decimals: u8| TokenInfo {
			symbol: "T".to_string(),
			address: Address::repeat_byte(byte),
			decimals,
			chain_id: ChainId(1),
		};
		ResolvedIntent {
			intent: Intent {
				user: Address::repeat_byte(0x11),
				token_in: "TKA".to_string(),
				token_out: "TKB".to_string(),
				amount_in: Decimal::ONE,
				min_amount_out: Decimal::ONE,
				source_chain_id: ChainId(1),
				destination_chain_id: ChainId(1),
				fee_mode: FeeMode::Stable,
				fee_cap: Decimal::ONE,
				deadline: 1_900_000_000,
				nonce: 42,
			},
			token_in: token(0xaa, 18),
			token_out: token(0xbb, 6),
			fee_token: token(0xcc, 6),
			amount_in: U256::from(10u64).pow(U256::from(18u64)),
			min_amount_out: U256::from(1_000_000u64),
			fee_cap: U256::from(1_000_000u64),
		}
	}

	#[test]
	fn test_adapter_call_layout() {
		let data = encoder()
			.encode_adapter_call(&step(), U256::from(1000u64), U256::from(990u64), ROUTER, 1_900_000_000)
			.unwrap();

		let selector = &keccak256("swap(address,address,uint256,uint256,address,uint256)")[..4];
		assert_eq!(&data[..4], selector);
		assert_eq!(data.len(), 4 + 6 * 32);

		let expected_args = (
			Address::repeat_byte(0xaa),
			Address::repeat_byte(0xbb),
			U256::from(1000u64),
			U256::from(990u64),
			ROUTER,
			U256::from(1_900_000_000u64),
		)
			.abi_encode_params();
		assert_eq!(&data[4..], expected_args.as_slice());
	}

	#[test]
	fn test_rejects_non_router_recipient() {
		let user = Address::repeat_byte(0x11);
		let result = encoder().encode_adapter_call(&step(), U256::from(1u64), U256::from(1u64), user, 1);
		assert!(matches!(
			result,
			Err(EncodingError::RecipientMismatch { expected, actual, .. }) if expected == ROUTER && actual == user
		));
	}

	#[test]
	fn test_rejects_unknown_chain() {
		let mut other = step();
		other.chain_id = ChainId(5);
		let result = encoder().encode_adapter_call(&other, U256::from(1u64), U256::from(1u64), ROUTER, 1);
		assert!(matches!(result, Err(EncodingError::UnknownChain(ChainId(5)))));
	}

	#[test]
	fn test_router_call_wraps_adapter_call() {
		let intent = resolved();
		let route = RouteCandidate {
			route_id: "r".to_string(),
			route_type: RouteType::SameChain,
			source_chain_id: ChainId(1),
			destination_chain_id: ChainId(1),
			token_in: intent.token_in.address,
			token_out: intent.token_out.address,
			amount_in: intent.amount_in,
			steps: vec![step()],
			expected_out: intent.min_amount_out,
			total_gas_cost: U256::ZERO,
			protocol_fee: U256::ZERO,
			net_user_output: intent.min_amount_out,
			score: 1.0,
			explanation: String::new(),
		};

		let encoded = encoder().encode_route(&intent, &route, ROUTER).unwrap();
		assert_eq!(encoded.adapter, ADAPTER);

		let decoded = abi::IRouterHub::executeRouteCall::abi_decode(&encoded.router_call).unwrap();
		assert_eq!(decoded.adapter, ADAPTER);
		assert_eq!(decoded.routeData, encoded.adapter_call);
		assert_eq!(decoded.intent.feeMode, 3);
		assert_eq!(decoded.intent.minOut, U256::from(1_000_000u64));
		assert_eq!(decoded.intent.nonce, U256::from(42u64));
		assert_eq!(decoded.intent.feeToken, Address::repeat_byte(0xcc));
	}

	#[test]
	fn test_approve_selector() {
		let data = CallEncoder::encode_approve(ROUTER, U256::MAX);
		assert_eq!(hex::encode(&data[..4]), "095ea7b3");
	}
}
