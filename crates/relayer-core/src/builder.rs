//! Wiring of the pipeline services from configuration.

use crate::clock::Clock;
use crate::coordinator::ExecutionCoordinator;
use crate::event_bus::EventBus;
use crate::history::{HistoryRecorder, StorageHistoryRecorder};
use crate::CoreError;
use relayer_account::{create_account, AccountService};
use relayer_config::{validate_config, ChainDirectory, RelayerConfig};
use relayer_delivery::create_orchestrator;
use relayer_encoding::CallEncoder;
use relayer_oracle::create_oracle;
use relayer_routing::implementations::http::create_planner;
use relayer_routing::{RouteCatalog, RoutePlanner};
use relayer_storage::{create_storage, StorageService};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds an [`ExecutionCoordinator`] and its collaborators.
///
/// Storage, clock, and event bus default to the configured backend, the
/// system clock, and a fresh bus; each can be replaced before `build`.
pub struct RelayerBuilder {
	config: RelayerConfig,
	clock: Option<Arc<dyn Clock>>,
	history: Option<Arc<dyn HistoryRecorder>>,
	events: Option<EventBus>,
}

impl RelayerBuilder {
	pub fn new(config: RelayerConfig) -> Self {
		Self {
			config,
			clock: None,
			history: None,
			events: None,
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	pub fn with_history(mut self, history: Arc<dyn HistoryRecorder>) -> Self {
		self.history = Some(history);
		self
	}

	pub fn with_event_bus(mut self, events: EventBus) -> Self {
		self.events = Some(events);
		self
	}

	pub fn build(self) -> Result<ExecutionCoordinator, CoreError> {
		let config = &self.config;
		validate_config(config).map_err(|e| CoreError::Configuration(e.to_string()))?;

		let registry = Arc::new(ChainDirectory::from_config(config));
		let oracle = Arc::new(
			create_oracle(&config.oracle).map_err(|e| CoreError::ServiceInit(format!("oracle: {}", e)))?,
		);

		let catalog = Arc::new(RouteCatalog::from_config(config));
		let planner_backend = create_planner(&config.planner)
			.map_err(|e| CoreError::ServiceInit(format!("route planner: {}", e)))?;
		if planner_backend.is_none() {
			info!("No route planner configured; every execution uses the fallback route");
		}
		let planner = Arc::new(RoutePlanner::new(
			planner_backend,
			catalog.clone(),
			Duration::from_secs(config.planner.timeout_secs),
		));
		let encoder = Arc::new(CallEncoder::new(catalog));

		let signer = create_account(&config.relayer.private_key)
			.map_err(|e| CoreError::Configuration(format!("relayer key: {}", e)))?;
		let account = Arc::new(AccountService::new(signer));
		info!(address = %account.address(), "Relaying account loaded");
		let orchestrator = Arc::new(create_orchestrator(config, account));

		let history = match self.history {
			Some(history) => history,
			None => {
				let storage = Arc::new(StorageService::new(create_storage(&config.storage)));
				Arc::new(StorageHistoryRecorder::new(storage)) as Arc<dyn HistoryRecorder>
			}
		};

		let mut coordinator = ExecutionCoordinator::new(
			registry,
			oracle,
			planner,
			encoder,
			orchestrator,
			config.execution.clone(),
		)
		.with_history(history);

		if let Some(clock) = self.clock {
			coordinator = coordinator.with_clock(clock);
		}
		if let Some(events) = self.events {
			coordinator = coordinator.with_event_bus(events);
		}

		Ok(coordinator)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relayer_config::{ConfigFormat, ConfigLoader};
	use relayer_types::ChainId;

	const CONFIG: &str = r#"
[relayer]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[chains.31337]
name = "local"
rpc_urls = ["http://127.0.0.1:8545"]
router = "0x0000000000000000000000000000000000000001"
default_swap_protocol = "uniswap"

[chains.31337.adapters]
uniswap = "0x0000000000000000000000000000000000000002"

[chains.31337.tokens.TKA]
address = "0x00000000000000000000000000000000000000aa"
decimals = 18
"#;

	fn config() -> RelayerConfig {
		ConfigLoader::new()
			.parse_str(CONFIG, ConfigFormat::Toml)
			.unwrap()
	}

	#[test]
	fn test_builds_from_config() {
		let coordinator = RelayerBuilder::new(config()).build().unwrap();
		assert!(coordinator.history().is_some());
		assert!(!coordinator.oracle().feed_table().is_empty());
	}

	#[test]
	fn test_rejects_bad_key() {
		let mut config = config();
		config.relayer.private_key = "not-a-key".to_string();

		let result = RelayerBuilder::new(config).build();
		assert!(matches!(result, Err(CoreError::Configuration(_))));
	}

	#[test]
	fn test_rejects_second_chain_without_bridge() {
		let mut config = config();
		let mut other = config.chains[&ChainId(31337)].clone();
		other.rpc_urls = vec!["http://127.0.0.1:9545".to_string()];
		config.chains.insert(ChainId(31338), other);

		let result = RelayerBuilder::new(config).build();
		assert!(matches!(result, Err(CoreError::Configuration(ref msg)) if msg.contains("default_bridge_protocol")));
	}
}
