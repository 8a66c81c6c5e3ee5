//! Configuration types for the intent relayer.

use crate::serde_helpers::{deserialize_chain_id_map, serialize_chain_id_map};
use relayer_types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerConfig {
	pub relayer: RelayerSettings,
	#[serde(
		deserialize_with = "deserialize_chain_id_map",
		serialize_with = "serialize_chain_id_map"
	)]
	pub chains: HashMap<ChainId, ChainConfig>,
	#[serde(default)]
	pub oracle: OracleConfig,
	#[serde(default)]
	pub planner: PlannerConfig,
	#[serde(default)]
	pub delivery: DeliveryConfig,
	#[serde(default)]
	pub execution: ExecutionConfig,
	#[serde(default)]
	pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerSettings {
	#[serde(default = "default_name")]
	pub name: String,
	/// Hex-encoded key of the relaying account.
	pub private_key: String,
}

/// One EVM chain the relayer can submit to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
	pub name: String,
	/// Endpoints tried in order until one answers the liveness probe.
	pub rpc_urls: Vec<String>,
	/// Router contract; the only valid recipient of adapter output.
	pub router: Address,
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	#[serde(default = "default_stable_symbol")]
	pub stable_symbol: String,
	pub default_swap_protocol: String,
	#[serde(default)]
	pub default_bridge_protocol: Option<String>,
	/// Protocol name to adapter contract.
	#[serde(default)]
	pub adapters: HashMap<String, Address>,
	/// Token symbol to contract and decimals.
	#[serde(default)]
	pub tokens: HashMap<String, TokenConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
	pub address: Address,
	pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
	#[serde(default = "default_oracle_url")]
	pub base_url: String,
	#[serde(default = "default_ttl_secs")]
	pub ttl_secs: u64,
	/// Maximum age of a feed's publish time before quotes are flagged stale.
	#[serde(default = "default_max_age_secs")]
	pub max_age_secs: u64,
	#[serde(default = "default_http_timeout_secs")]
	pub timeout_secs: u64,
	/// Extra or replacement feed ids keyed by canonical symbol.
	#[serde(default)]
	pub feeds: HashMap<String, String>,
	/// Extra symbol aliases, e.g. a wrapped token to its underlying asset.
	#[serde(default)]
	pub aliases: HashMap<String, String>,
}

impl OracleConfig {
	pub fn ttl(&self) -> Duration {
		Duration::from_secs(self.ttl_secs)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

impl Default for OracleConfig {
	fn default() -> Self {
		Self {
			base_url: default_oracle_url(),
			ttl_secs: default_ttl_secs(),
			max_age_secs: default_max_age_secs(),
			timeout_secs: default_http_timeout_secs(),
			feeds: HashMap::new(),
			aliases: HashMap::new(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
	/// Base URL of the route planning service; unset means fallback only.
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default = "default_http_timeout_secs")]
	pub timeout_secs: u64,
}

impl Default for PlannerConfig {
	fn default() -> Self {
		Self {
			url: None,
			timeout_secs: default_http_timeout_secs(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
	#[serde(default = "default_probe_timeout_secs")]
	pub probe_timeout_secs: u64,
	/// Upper bound for every other JSON-RPC request.
	#[serde(default = "default_rpc_timeout_secs")]
	pub rpc_timeout_secs: u64,
	#[serde(default = "default_receipt_timeout_secs")]
	pub receipt_timeout_secs: u64,
	#[serde(default = "default_approval_timeout_secs")]
	pub approval_timeout_secs: u64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Percentage added on top of estimated and fallback gas limits.
	#[serde(default = "default_gas_buffer_percent")]
	pub gas_buffer_percent: u64,
	/// Gas limit used when estimation fails.
	#[serde(default = "default_fallback_gas_limit")]
	pub fallback_gas_limit: u64,
	#[serde(default = "default_approval_gas_limit")]
	pub approval_gas_limit: u64,
}

impl DeliveryConfig {
	pub fn probe_timeout(&self) -> Duration {
		Duration::from_secs(self.probe_timeout_secs)
	}

	pub fn rpc_timeout(&self) -> Duration {
		Duration::from_secs(self.rpc_timeout_secs)
	}

	pub fn receipt_timeout(&self) -> Duration {
		Duration::from_secs(self.receipt_timeout_secs)
	}

	pub fn approval_timeout(&self) -> Duration {
		Duration::from_secs(self.approval_timeout_secs)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			probe_timeout_secs: default_probe_timeout_secs(),
			rpc_timeout_secs: default_rpc_timeout_secs(),
			receipt_timeout_secs: default_receipt_timeout_secs(),
			approval_timeout_secs: default_approval_timeout_secs(),
			poll_interval_ms: default_poll_interval_ms(),
			gas_buffer_percent: default_gas_buffer_percent(),
			fallback_gas_limit: default_fallback_gas_limit(),
			approval_gas_limit: default_approval_gas_limit(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
	/// Haircut applied to the oracle quote, in basis points.
	///
	/// Must equal the slippage constant compiled into the deployed adapter
	/// contracts. When the two drift apart, quotes that look safe off-chain
	/// revert on-chain with an output-below-minimum error.
	#[serde(default = "default_slippage_bps")]
	pub slippage_bps: u32,
	/// Grant the router an allowance for the input token before each swap.
	/// Only needed when the relaying account supplies the liquidity itself.
	#[serde(default)]
	pub approve_input_token: bool,
}

impl Default for ExecutionConfig {
	fn default() -> Self {
		Self {
			slippage_bps: default_slippage_bps(),
			approve_input_token: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	Memory,
	File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
	#[serde(default = "default_storage_backend")]
	pub backend: StorageBackend,
	#[serde(default = "default_storage_path")]
	pub path: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_storage_backend(),
			path: default_storage_path(),
		}
	}
}

fn default_name() -> String {
	"intent-relayer".to_string()
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

fn default_stable_symbol() -> String {
	"USDC".to_string()
}

fn default_oracle_url() -> String {
	"https://hermes.pyth.network".to_string()
}

fn default_ttl_secs() -> u64 {
	15
}

fn default_max_age_secs() -> u64 {
	60
}

fn default_http_timeout_secs() -> u64 {
	5
}

fn default_probe_timeout_secs() -> u64 {
	10
}

fn default_rpc_timeout_secs() -> u64 {
	15
}

fn default_receipt_timeout_secs() -> u64 {
	120
}

fn default_approval_timeout_secs() -> u64 {
	60
}

fn default_poll_interval_ms() -> u64 {
	2_000
}

fn default_gas_buffer_percent() -> u64 {
	20
}

fn default_fallback_gas_limit() -> u64 {
	500_000
}

fn default_approval_gas_limit() -> u64 {
	100_000
}

fn default_slippage_bps() -> u32 {
	50
}

fn default_storage_backend() -> StorageBackend {
	StorageBackend::Memory
}

fn default_storage_path() -> PathBuf {
	PathBuf::from("./data/executions")
}
