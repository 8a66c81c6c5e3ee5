use crate::{Address, ChainId, ExecutionError, TokenInfo, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the protocol fee for an intent is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeMode {
	/// Fee paid in the source chain's native asset.
	Native,
	/// Fee deducted from the input token.
	Input,
	/// Fee deducted from the output token.
	Output,
	/// Fee paid in the chain's configured stablecoin.
	Stable,
}

impl FeeMode {
	/// Discriminant used by the router's `feeMode` field.
	pub fn as_u8(&self) -> u8 {
		match self {
			FeeMode::Native => 0,
			FeeMode::Input => 1,
			FeeMode::Output => 2,
			FeeMode::Stable => 3,
		}
	}
}

impl fmt::Display for FeeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			FeeMode::Native => "NATIVE",
			FeeMode::Input => "INPUT",
			FeeMode::Output => "OUTPUT",
			FeeMode::Stable => "STABLE",
		};
		f.write_str(name)
	}
}

/// A user's request to convert one token into another.
///
/// Amounts are human-readable (`1.5` USDC, not `1500000`); conversion to
/// base units happens once the tokens are resolved against the configured
/// decimals for their chains. Token fields accept either a symbol or a
/// `0x` address of a configured token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
	pub user: Address,
	pub token_in: String,
	pub token_out: String,
	pub amount_in: Decimal,
	pub min_amount_out: Decimal,
	pub source_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	pub fee_mode: FeeMode,
	#[serde(default)]
	pub fee_cap: Decimal,
	/// Unix seconds after which the intent must not be submitted.
	pub deadline: u64,
	#[serde(default)]
	pub nonce: u64,
}

impl Intent {
	/// Checks the intent's self-contained invariants against `now`.
	///
	/// Chain and token membership depends on configuration and is checked
	/// by the coordinator.
	pub fn validate(&self, now: u64) -> Result<(), ExecutionError> {
		if self.amount_in <= Decimal::ZERO {
			return Err(ExecutionError::Validation(
				"amountIn must be greater than zero".to_string(),
			));
		}
		if self.min_amount_out <= Decimal::ZERO {
			return Err(ExecutionError::Validation(
				"minAmountOut must be greater than zero".to_string(),
			));
		}
		if self.fee_cap < Decimal::ZERO {
			return Err(ExecutionError::Validation(
				"feeCap must not be negative".to_string(),
			));
		}
		if self.deadline <= now {
			return Err(ExecutionError::Validation(format!(
				"deadline {} is not in the future (now {})",
				self.deadline, now
			)));
		}
		if self.token_in.trim().is_empty() || self.token_out.trim().is_empty() {
			return Err(ExecutionError::Validation(
				"tokenIn and tokenOut are required".to_string(),
			));
		}
		Ok(())
	}

	pub fn is_cross_chain(&self) -> bool {
		self.source_chain_id != self.destination_chain_id
	}
}

/// An intent whose tokens have been resolved to configured contracts and
/// whose amounts are expressed in each token's base units.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIntent {
	pub intent: Intent,
	/// Input token on the source chain.
	pub token_in: TokenInfo,
	/// Output token on the destination chain.
	pub token_out: TokenInfo,
	pub fee_token: TokenInfo,
	pub amount_in: U256,
	pub min_amount_out: U256,
	/// Fee cap in fee-token base units.
	pub fee_cap: U256,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ErrorKind;

	fn dec(s: &str) -> Decimal {
		s.parse().unwrap()
	}

	fn intent() -> Intent {
		Intent {
			user: Address::repeat_byte(0x11),
			token_in: "WETH".to_string(),
			token_out: "USDC".to_string(),
			amount_in: dec("0.5"),
			min_amount_out: dec("900"),
			source_chain_id: ChainId(1),
			destination_chain_id: ChainId(1),
			fee_mode: FeeMode::Input,
			fee_cap: dec("1"),
			deadline: 2_000,
			nonce: 7,
		}
	}

	#[test]
	fn test_valid_intent_passes() {
		assert!(intent().validate(1_000).is_ok());
	}

	#[test]
	fn test_zero_amount_rejected() {
		let mut bad = intent();
		bad.amount_in = Decimal::ZERO;
		let err = bad.validate(1_000).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Validation);
	}

	#[test]
	fn test_past_deadline_rejected() {
		let err = intent().validate(2_000).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Validation);
	}

	#[test]
	fn test_fee_mode_discriminants() {
		assert_eq!(FeeMode::Native.as_u8(), 0);
		assert_eq!(FeeMode::Input.as_u8(), 1);
		assert_eq!(FeeMode::Output.as_u8(), 2);
		assert_eq!(FeeMode::Stable.as_u8(), 3);
	}

	#[test]
	fn test_intent_json_shape() {
		let json = r#"{
			"user": "0x1111111111111111111111111111111111111111",
			"tokenIn": "WETH",
			"tokenOut": "USDC",
			"amountIn": "0.5",
			"minAmountOut": "900",
			"sourceChainId": 1,
			"destinationChainId": 1,
			"feeMode": "INPUT",
			"feeCap": "1",
			"deadline": 2000,
			"nonce": 7
		}"#;
		let parsed: Intent = serde_json::from_str(json).unwrap();
		assert_eq!(parsed, intent());
	}
}
