//! Read-only token and chain lookups backed by configuration.

use crate::types::{ChainConfig, RelayerConfig};
use relayer_types::{Address, ChainId, TokenInfo, TokenRegistry, NATIVE_TOKEN_ADDRESS};
use std::collections::HashMap;

/// Decimals assumed for a native asset that has no explicit token entry.
const NATIVE_DECIMALS: u8 = 18;

/// Configuration-backed implementation of [`TokenRegistry`].
#[derive(Debug, Clone)]
pub struct ChainDirectory {
	chains: HashMap<ChainId, ChainConfig>,
}

impl ChainDirectory {
	pub fn new(chains: HashMap<ChainId, ChainConfig>) -> Self {
		Self { chains }
	}

	pub fn from_config(config: &RelayerConfig) -> Self {
		Self::new(config.chains.clone())
	}

	pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
		self.chains.get(&chain_id)
	}

	pub fn rpc_urls(&self, chain_id: ChainId) -> Option<&[String]> {
		self.chains.get(&chain_id).map(|c| c.rpc_urls.as_slice())
	}

	pub fn chain_ids(&self) -> Vec<ChainId> {
		let mut ids: Vec<ChainId> = self.chains.keys().copied().collect();
		ids.sort();
		ids
	}

	fn token_by_symbol(chain_id: ChainId, chain: &ChainConfig, symbol: &str) -> Option<TokenInfo> {
		let wanted = symbol.trim().to_uppercase();
		let found = chain
			.tokens
			.iter()
			.find(|(configured, _)| configured.to_uppercase() == wanted)
			.map(|(configured, token)| TokenInfo {
				symbol: configured.to_uppercase(),
				address: token.address,
				decimals: token.decimals,
				chain_id,
			});

		match found {
			Some(token) => Some(token),
			None if chain.native_symbol.to_uppercase() == wanted => Some(TokenInfo {
				symbol: wanted,
				address: NATIVE_TOKEN_ADDRESS,
				decimals: NATIVE_DECIMALS,
				chain_id,
			}),
			None => None,
		}
	}

	fn token_by_address(chain_id: ChainId, chain: &ChainConfig, address: Address) -> Option<TokenInfo> {
		if address == NATIVE_TOKEN_ADDRESS {
			return Self::token_by_symbol(chain_id, chain, &chain.native_symbol);
		}
		chain
			.tokens
			.iter()
			.find(|(_, token)| token.address == address)
			.map(|(symbol, token)| TokenInfo {
				symbol: symbol.to_uppercase(),
				address: token.address,
				decimals: token.decimals,
				chain_id,
			})
	}
}

impl TokenRegistry for ChainDirectory {
	fn has_chain(&self, chain_id: ChainId) -> bool {
		self.chains.contains_key(&chain_id)
	}

	fn resolve_token(&self, chain_id: ChainId, token: &str) -> Option<TokenInfo> {
		let chain = self.chains.get(&chain_id)?;
		if token.starts_with("0x") {
			let address = token.parse::<Address>().ok()?;
			return Self::token_by_address(chain_id, chain, address);
		}
		Self::token_by_symbol(chain_id, chain, token)
	}

	fn native_symbol(&self, chain_id: ChainId) -> Option<String> {
		self.chains.get(&chain_id).map(|c| c.native_symbol.clone())
	}

	fn stable_symbol(&self, chain_id: ChainId) -> Option<String> {
		self.chains.get(&chain_id).map(|c| c.stable_symbol.clone())
	}

	fn router(&self, chain_id: ChainId) -> Option<Address> {
		self.chains.get(&chain_id).map(|c| c.router)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::TokenConfig;

	fn directory() -> ChainDirectory {
		let mut tokens = HashMap::new();
		tokens.insert(
			"USDC".to_string(),
			TokenConfig {
				address: Address::repeat_byte(0xaa),
				decimals: 6,
			},
		);
		tokens.insert(
			"weth".to_string(),
			TokenConfig {
				address: Address::repeat_byte(0xbb),
				decimals: 18,
			},
		);
		let mut chains = HashMap::new();
		chains.insert(
			ChainId(1),
			ChainConfig {
				name: "mainnet".to_string(),
				rpc_urls: vec!["http://localhost:8545".to_string()],
				router: Address::repeat_byte(0x01),
				native_symbol: "ETH".to_string(),
				stable_symbol: "USDC".to_string(),
				default_swap_protocol: "uniswap".to_string(),
				default_bridge_protocol: None,
				adapters: HashMap::new(),
				tokens,
			},
		);
		ChainDirectory::new(chains)
	}

	#[test]
	fn test_symbol_lookup_is_case_insensitive() {
		let token = directory().resolve_token(ChainId(1), "usdc").unwrap();
		assert_eq!(token.decimals, 6);
		assert_eq!(token.symbol, "USDC");

		let weth = directory().resolve_token(ChainId(1), "WETH").unwrap();
		assert_eq!(weth.address, Address::repeat_byte(0xbb));
	}

	#[test]
	fn test_address_lookup() {
		let address = format!("{}", Address::repeat_byte(0xaa));
		let token = directory().resolve_token(ChainId(1), &address).unwrap();
		assert_eq!(token.symbol, "USDC");
	}

	#[test]
	fn test_native_symbol_falls_back_to_placeholder() {
		let eth = directory().resolve_token(ChainId(1), "ETH").unwrap();
		assert!(eth.is_native());
		assert_eq!(eth.decimals, 18);
	}

	#[test]
	fn test_unknown_chain_or_token() {
		assert!(directory().resolve_token(ChainId(2), "USDC").is_none());
		assert!(directory().resolve_token(ChainId(1), "DOGE").is_none());
		assert!(!directory().has_chain(ChainId(2)));
	}
}
