//! Configuration loading for the intent relayer.
//!
//! Configuration is read from TOML, JSON, or YAML (chosen by file
//! extension). `${VAR}` references are substituted from the environment
//! before parsing, selected fields can be overridden by prefixed
//! environment variables, and the result is validated before use.

use relayer_types::ChainId;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

mod directory;
pub mod serde_helpers;
mod types;

pub use directory::ChainDirectory;
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {}",
				path.display()
			))),
		}
	}
}

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "RELAYER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads, overrides, and validates the configuration.
	pub async fn load(&self) -> Result<RelayerConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		info!("Loading configuration from {}", file_path.display());
		let mut config = self.load_from_file(file_path).await?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &Path) -> Result<RelayerConfig, ConfigError> {
		if !file_path.exists() {
			return Err(ConfigError::FileNotFound(file_path.display().to_string()));
		}
		let format = ConfigFormat::from_path(file_path)?;
		let content = tokio::fs::read_to_string(file_path).await?;
		self.parse_str(&content, format)
	}

	/// Parses configuration text after substituting `${VAR}` references.
	pub fn parse_str(&self, content: &str, format: ConfigFormat) -> Result<RelayerConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => serde_json::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn apply_env_overrides(&self, config: &mut RelayerConfig) -> Result<(), ConfigError> {
		if let Ok(key) = env::var(format!("{}PRIVATE_KEY", self.env_prefix)) {
			debug!("Overriding private key from environment");
			config.relayer.private_key = key;
		}

		if let Ok(url) = env::var(format!("{}PLANNER_URL", self.env_prefix)) {
			debug!("Overriding planner URL from environment");
			config.planner.url = Some(url);
		}

		let rpc_prefix = format!("{}RPC_URLS_", self.env_prefix);
		for (name, value) in env::vars() {
			let Some(chain_id) = name.strip_prefix(&rpc_prefix) else {
				continue;
			};
			let chain_id: ChainId = chain_id.parse().map_err(|_| {
				ConfigError::ValidationError(format!("Invalid chain id in {}", name))
			})?;
			if let Some(chain) = config.chains.get_mut(&chain_id) {
				debug!(chain_id = %chain_id, "Overriding RPC URLs from environment");
				chain.rpc_urls = value
					.split(',')
					.map(|url| url.trim().to_string())
					.filter(|url| !url.is_empty())
					.collect();
			}
		}

		Ok(())
	}
}

fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();

	let re = regex::Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks cross-field constraints that serde cannot express.
pub fn validate_config(config: &RelayerConfig) -> Result<(), ConfigError> {
	validate_private_key(&config.relayer.private_key)?;

	if config.chains.is_empty() {
		return Err(ConfigError::ValidationError(
			"At least one chain must be configured".to_string(),
		));
	}

	for (chain_id, chain) in &config.chains {
		if chain.rpc_urls.is_empty() {
			return Err(ConfigError::ValidationError(format!(
				"Chain {} has no RPC URLs",
				chain_id
			)));
		}
		for url in &chain.rpc_urls {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(ConfigError::ValidationError(format!(
					"RPC URL for chain {} must start with http:// or https://: {}",
					chain_id, url
				)));
			}
		}
		if !has_adapter(chain, &chain.default_swap_protocol) {
			return Err(ConfigError::ValidationError(format!(
				"Default swap protocol '{}' on chain {} has no adapter",
				chain.default_swap_protocol, chain_id
			)));
		}
		match &chain.default_bridge_protocol {
			Some(bridge) if !has_adapter(chain, bridge) => {
				return Err(ConfigError::ValidationError(format!(
					"Default bridge protocol '{}' on chain {} has no adapter",
					bridge, chain_id
				)));
			}
			// Every configured chain pair needs a fallback bridge route.
			None if config.chains.len() > 1 => {
				return Err(ConfigError::ValidationError(format!(
					"Chain {} needs a default_bridge_protocol when several chains are configured",
					chain_id
				)));
			}
			_ => {}
		}
		for (symbol, token) in &chain.tokens {
			if token.decimals > 36 {
				return Err(ConfigError::ValidationError(format!(
					"Token {} on chain {} has unsupported decimals {}",
					symbol, chain_id, token.decimals
				)));
			}
		}
	}

	if config.execution.slippage_bps >= 10_000 {
		return Err(ConfigError::ValidationError(format!(
			"slippage_bps must be below 10000, got {}",
			config.execution.slippage_bps
		)));
	}

	if config.oracle.timeout_secs == 0 || config.planner.timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"HTTP timeouts must be greater than zero".to_string(),
		));
	}

	Ok(())
}

/// Protocol names are matched case-insensitively, as the route catalog does.
fn has_adapter(chain: &ChainConfig, protocol: &str) -> bool {
	chain
		.adapters
		.keys()
		.any(|name| name.eq_ignore_ascii_case(protocol))
}

fn validate_private_key(key: &str) -> Result<(), ConfigError> {
	let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

	if key_without_prefix.len() != 64 {
		return Err(ConfigError::ValidationError(
			"Private key must be 64 hex characters (32 bytes)".to_string(),
		));
	}

	if hex::decode(key_without_prefix).is_err() {
		return Err(ConfigError::ValidationError(
			"Private key must be valid hexadecimal".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn sample_toml(key: &str) -> String {
		format!(
			r#"
[relayer]
name = "test-relayer"
private_key = "{key}"

[chains.11155111]
name = "sepolia"
rpc_urls = ["https://rpc-a.example", "https://rpc-b.example"]
router = "0x1111111111111111111111111111111111111111"
default_swap_protocol = "uniswap"
default_bridge_protocol = "mockbridge"

[chains.11155111.adapters]
uniswap = "0x2222222222222222222222222222222222222222"
mockbridge = "0x3333333333333333333333333333333333333333"

[chains.11155111.tokens.USDC]
address = "0x4444444444444444444444444444444444444444"
decimals = 6

[execution]
slippage_bps = 50
"#
		)
	}

	#[test]
	fn test_toml_parsing_with_defaults() {
		let config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		assert_eq!(config.relayer.name, "test-relayer");
		let chain = config.chains.get(&ChainId(11155111)).unwrap();
		assert_eq!(chain.rpc_urls.len(), 2);
		assert_eq!(chain.native_symbol, "ETH");
		assert_eq!(config.oracle.ttl_secs, 15);
		assert_eq!(config.oracle.max_age_secs, 60);
		assert_eq!(config.delivery.receipt_timeout_secs, 120);
		assert_eq!(config.delivery.gas_buffer_percent, 20);
		assert_eq!(config.storage.backend, StorageBackend::Memory);
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("RELAYER_CFG_TEST_SUBST_KEY", KEY);
		let config = ConfigLoader::new()
			.parse_str(&sample_toml("${RELAYER_CFG_TEST_SUBST_KEY}"), ConfigFormat::Toml)
			.unwrap();
		assert_eq!(config.relayer.private_key, KEY);
	}

	#[test]
	fn test_missing_env_var_is_an_error() {
		let result = ConfigLoader::new().parse_str(
			&sample_toml("${RELAYER_CFG_TEST_DEFINITELY_UNSET}"),
			ConfigFormat::Toml,
		);
		assert!(matches!(result, Err(ConfigError::EnvVarNotFound(_))));
	}

	#[test]
	fn test_rejects_bad_slippage_and_key() {
		let mut config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		config.execution.slippage_bps = 10_000;
		assert!(validate_config(&config).is_err());

		config.execution.slippage_bps = 50;
		config.relayer.private_key = "0x1234".to_string();
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_rejects_default_protocol_without_adapter() {
		let mut config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		if let Some(chain) = config.chains.get_mut(&ChainId(11155111)) {
			chain.default_swap_protocol = "sushiswap".to_string();
		}
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_protocol_names_ignore_case() {
		let mut config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		if let Some(chain) = config.chains.get_mut(&ChainId(11155111)) {
			chain.default_swap_protocol = "Uniswap".to_string();
			chain.default_bridge_protocol = Some("MockBridge".to_string());
		}
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_multi_chain_requires_bridge_protocol() {
		let mut config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		let mut polygon = config.chains[&ChainId(11155111)].clone();
		polygon.default_bridge_protocol = None;
		config.chains.insert(ChainId(80002), polygon);

		let result = validate_config(&config);
		assert!(
			matches!(result, Err(ConfigError::ValidationError(ref msg)) if msg.contains("80002"))
		);

		if let Some(chain) = config.chains.get_mut(&ChainId(80002)) {
			chain.default_bridge_protocol = Some("mockbridge".to_string());
		}
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_single_chain_needs_no_bridge() {
		let mut config = ConfigLoader::new()
			.parse_str(&sample_toml(KEY), ConfigFormat::Toml)
			.unwrap();
		if let Some(chain) = config.chains.get_mut(&ChainId(11155111)) {
			chain.default_bridge_protocol = None;
		}
		assert!(validate_config(&config).is_ok());
	}

	#[tokio::test]
	async fn test_load_from_file_applies_overrides() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("relayer.toml");
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(sample_toml(KEY).as_bytes()).unwrap();

		env::set_var("RELAYER_LOADTEST_PLANNER_URL", "http://planner.local");
		env::set_var(
			"RELAYER_LOADTEST_RPC_URLS_11155111",
			"https://override-a.example, https://override-b.example",
		);

		let config = ConfigLoader::new()
			.with_file(&path)
			.with_env_prefix("RELAYER_LOADTEST_")
			.load()
			.await
			.unwrap();

		assert_eq!(config.planner.url.as_deref(), Some("http://planner.local"));
		assert_eq!(
			config.chains[&ChainId(11155111)].rpc_urls,
			vec![
				"https://override-a.example".to_string(),
				"https://override-b.example".to_string()
			]
		);
	}

	#[tokio::test]
	async fn test_unsupported_extension() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("relayer.ini");
		std::fs::write(&path, "x").unwrap();
		let result = ConfigLoader::new().with_file(&path).load().await;
		assert!(matches!(result, Err(ConfigError::ParseError(_))));
	}
}
