//! Static mapping of chains and protocols to deployed contracts.

use relayer_config::RelayerConfig;
use relayer_types::{Address, ChainId};
use std::collections::HashMap;

/// Contracts deployed on one chain.
#[derive(Debug, Clone)]
pub struct ChainRoutes {
	pub router: Address,
	pub default_swap_protocol: String,
	pub default_bridge_protocol: Option<String>,
	/// Keyed by lowercase protocol name.
	pub adapters: HashMap<String, Address>,
}

impl ChainRoutes {
	pub fn new(router: Address, default_swap_protocol: &str) -> Self {
		Self {
			router,
			default_swap_protocol: default_swap_protocol.to_lowercase(),
			default_bridge_protocol: None,
			adapters: HashMap::new(),
		}
	}

	pub fn with_adapter(mut self, protocol: &str, adapter: Address) -> Self {
		self.adapters.insert(protocol.to_lowercase(), adapter);
		self
	}

	pub fn with_bridge(mut self, protocol: &str, adapter: Address) -> Self {
		self.default_bridge_protocol = Some(protocol.to_lowercase());
		self.with_adapter(protocol, adapter)
	}
}

/// Lookup of `{chain, protocol} -> adapter` and `chain -> router`.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
	chains: HashMap<ChainId, ChainRoutes>,
}

impl RouteCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(config: &RelayerConfig) -> Self {
		let chains = config
			.chains
			.iter()
			.map(|(chain_id, chain)| {
				let routes = ChainRoutes {
					router: chain.router,
					default_swap_protocol: chain.default_swap_protocol.to_lowercase(),
					default_bridge_protocol: chain
						.default_bridge_protocol
						.as_ref()
						.map(|p| p.to_lowercase()),
					adapters: chain
						.adapters
						.iter()
						.map(|(protocol, address)| (protocol.to_lowercase(), *address))
						.collect(),
				};
				(*chain_id, routes)
			})
			.collect();
		Self { chains }
	}

	pub fn with_chain(mut self, chain_id: ChainId, routes: ChainRoutes) -> Self {
		self.chains.insert(chain_id, routes);
		self
	}

	pub fn router(&self, chain_id: ChainId) -> Option<Address> {
		self.chains.get(&chain_id).map(|c| c.router)
	}

	pub fn adapter(&self, chain_id: ChainId, protocol: &str) -> Option<Address> {
		self.chains
			.get(&chain_id)?
			.adapters
			.get(&protocol.to_lowercase())
			.copied()
	}

	/// Default same-chain swap protocol and its adapter.
	pub fn default_swap(&self, chain_id: ChainId) -> Option<(String, Address)> {
		let chain = self.chains.get(&chain_id)?;
		let adapter = chain.adapters.get(&chain.default_swap_protocol)?;
		Some((chain.default_swap_protocol.clone(), *adapter))
	}

	/// Default bridge protocol and its adapter, if the chain has one.
	pub fn default_bridge(&self, chain_id: ChainId) -> Option<(String, Address)> {
		let chain = self.chains.get(&chain_id)?;
		let protocol = chain.default_bridge_protocol.as_ref()?;
		let adapter = chain.adapters.get(protocol)?;
		Some((protocol.clone(), *adapter))
	}

	pub fn is_known_adapter(&self, chain_id: ChainId, adapter: Address) -> bool {
		self.chains
			.get(&chain_id)
			.map(|c| c.adapters.values().any(|a| *a == adapter))
			.unwrap_or(false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn catalog() -> RouteCatalog {
		RouteCatalog::new().with_chain(
			ChainId(1),
			ChainRoutes::new(Address::repeat_byte(1), "UniswapV3")
				.with_adapter("UniswapV3", Address::repeat_byte(2))
				.with_bridge("MockBridge", Address::repeat_byte(3)),
		)
	}

	#[test]
	fn test_protocol_lookup_ignores_case() {
		let catalog = catalog();
		assert_eq!(
			catalog.adapter(ChainId(1), "uniswapv3"),
			Some(Address::repeat_byte(2))
		);
		assert_eq!(catalog.router(ChainId(1)), Some(Address::repeat_byte(1)));
		assert!(catalog.adapter(ChainId(2), "uniswapv3").is_none());
	}

	#[test]
	fn test_defaults() {
		let catalog = catalog();
		assert_eq!(
			catalog.default_swap(ChainId(1)),
			Some(("uniswapv3".to_string(), Address::repeat_byte(2)))
		);
		assert_eq!(
			catalog.default_bridge(ChainId(1)).map(|(_, a)| a),
			Some(Address::repeat_byte(3))
		);
		assert!(catalog.is_known_adapter(ChainId(1), Address::repeat_byte(3)));
		assert!(!catalog.is_known_adapter(ChainId(1), Address::repeat_byte(9)));
	}
}
