use crate::{Address, ChainId};
use alloy::primitives::address;
use serde::{Deserialize, Serialize};

/// Placeholder address used for a chain's native asset.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// A token contract as configured for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
	pub symbol: String,
	pub address: Address,
	pub decimals: u8,
	pub chain_id: ChainId,
}

impl TokenInfo {
	pub fn is_native(&self) -> bool {
		self.address == NATIVE_TOKEN_ADDRESS
	}
}

/// Token and chain lookups the pipeline depends on.
///
/// Implementations are read-only views over deployment configuration.
pub trait TokenRegistry: Send + Sync {
	fn has_chain(&self, chain_id: ChainId) -> bool;

	/// Resolves a symbol or a `0x` address to a configured token.
	fn resolve_token(&self, chain_id: ChainId, token: &str) -> Option<TokenInfo>;

	/// Symbol of the chain's native asset, used for `NATIVE` fees.
	fn native_symbol(&self, chain_id: ChainId) -> Option<String>;

	/// Symbol of the chain's stablecoin, used for `STABLE` fees.
	fn stable_symbol(&self, chain_id: ChainId) -> Option<String>;

	/// Router contract that executes intents on the chain.
	fn router(&self, chain_id: ChainId) -> Option<Address>;
}
