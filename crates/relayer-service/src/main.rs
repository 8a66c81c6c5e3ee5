use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relayer_config::{ConfigLoader, RelayerConfig};
use relayer_core::RelayerBuilder;
use relayer_oracle::create_oracle;
use relayer_types::{ChainId, Intent, B256};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "intent-relayer")]
#[command(about = "Quotes, routes, and submits swap intents", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/relayer.toml")]
	config: PathBuf,

	#[arg(long, env = "RELAYER_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Execute an intent read from a JSON file
	Execute {
		#[arg(long, value_name = "FILE")]
		intent: PathBuf,
	},
	/// Print USD quotes for one or more symbols
	Quote {
		#[arg(long, value_delimiter = ',', required = true)]
		symbols: Vec<String>,
		#[arg(long)]
		chain_id: u64,
	},
	/// Look up a submitted transaction
	Status {
		#[arg(long)]
		tx_hash: String,
		#[arg(long)]
		chain_id: u64,
	},
	/// Report oracle cache state and RPC endpoint reachability
	Health,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match &cli.command {
		Commands::Execute { intent } => execute(&cli, intent).await,
		Commands::Quote { symbols, chain_id } => quote(&cli, symbols, ChainId(*chain_id)).await,
		Commands::Status { tx_hash, chain_id } => status(&cli, tx_hash, ChainId(*chain_id)).await,
		Commands::Health => health(&cli).await,
		Commands::Validate => validate(&cli).await,
	}
}

async fn load_config(cli: &Cli) -> Result<RelayerConfig> {
	info!("Loading configuration from: {:?}", cli.config);
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn execute(cli: &Cli, intent_path: &Path) -> Result<ExitCode> {
	let config = load_config(cli).await?;

	let raw = tokio::fs::read_to_string(intent_path)
		.await
		.with_context(|| format!("Failed to read intent file {:?}", intent_path))?;
	let intent: Intent = serde_json::from_str(&raw).context("Failed to parse intent")?;

	let coordinator = RelayerBuilder::new(config)
		.build()
		.context("Failed to build relayer")?;

	match coordinator.execute(intent).await {
		Ok(report) => {
			println!("{}", serde_json::to_string_pretty(&report)?);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			let failure = serde_json::json!({
				"kind": e.kind(),
				"message": e.to_string(),
				"retryable": e.is_retryable(),
				"txHash": e.tx_hash(),
			});
			println!("{}", serde_json::to_string_pretty(&failure)?);
			Ok(ExitCode::FAILURE)
		}
	}
}

async fn quote(cli: &Cli, symbols: &[String], chain_id: ChainId) -> Result<ExitCode> {
	let config = load_config(cli).await?;
	let oracle = create_oracle(&config.oracle).context("Failed to build oracle")?;

	let quotes = oracle.get_prices(symbols, chain_id).await;
	let mut ordered = Vec::with_capacity(symbols.len());
	for symbol in symbols {
		if let Some(quote) = quotes.get(symbol) {
			ordered.push(quote);
		}
	}
	println!("{}", serde_json::to_string_pretty(&ordered)?);

	if ordered.iter().all(|quote| quote.is_available()) {
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::FAILURE)
	}
}

async fn status(cli: &Cli, tx_hash: &str, chain_id: ChainId) -> Result<ExitCode> {
	let tx_hash: B256 = tx_hash
		.parse()
		.with_context(|| format!("Invalid transaction hash {}", tx_hash))?;
	let config = load_config(cli).await?;
	let coordinator = RelayerBuilder::new(config)
		.build()
		.context("Failed to build relayer")?;

	let result = coordinator
		.orchestrator()
		.get_transaction_status(tx_hash, chain_id)
		.await
		.context("Failed to query transaction")?;
	println!("{}", serde_json::to_string_pretty(&result)?);
	Ok(ExitCode::SUCCESS)
}

async fn health(cli: &Cli) -> Result<ExitCode> {
	let config = load_config(cli).await?;
	let mut chain_ids: Vec<ChainId> = config.chains.keys().copied().collect();
	chain_ids.sort();

	let coordinator = RelayerBuilder::new(config)
		.build()
		.context("Failed to build relayer")?;

	let oracle = coordinator.oracle().health_check().await;
	let mut endpoints = serde_json::Map::new();
	let mut healthy = true;
	for chain_id in chain_ids {
		let entry = match coordinator.orchestrator().resolve_endpoint(chain_id).await {
			Ok(rpc) => serde_json::json!({ "reachable": true, "url": rpc.url() }),
			Err(e) => {
				healthy = false;
				serde_json::json!({ "reachable": false, "error": e.to_string() })
			}
		};
		endpoints.insert(chain_id.to_string(), entry);
	}

	let report = serde_json::json!({
		"oracle": oracle,
		"endpoints": endpoints,
	});
	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(if healthy {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	})
}

async fn validate(cli: &Cli) -> Result<ExitCode> {
	let config = load_config(cli).await?;

	info!("Configuration is valid");
	info!("Relayer name: {}", config.relayer.name);
	info!(
		"Route planner: {}",
		config.planner.url.as_deref().unwrap_or("none (fallback routes only)")
	);
	info!("Slippage: {} bps", config.execution.slippage_bps);

	let mut chains: Vec<_> = config.chains.iter().collect();
	chains.sort_by_key(|(chain_id, _)| **chain_id);
	for (chain_id, chain) in chains {
		info!(
			"  Chain {} ({}): {} RPC endpoint(s), {} token(s), {} adapter(s)",
			chain_id,
			chain.name,
			chain.rpc_urls.len(),
			chain.tokens.len(),
			chain.adapters.len()
		);
	}

	Ok(ExitCode::SUCCESS)
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter =
		EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
