//! Transaction lifecycle for the relaying account.
//!
//! The [`TransactionOrchestrator`] picks a live RPC endpoint, assigns the
//! nonce, estimates gas, signs locally, broadcasts, and waits for a
//! receipt. Reverted transactions are replayed one block earlier to
//! recover a readable reason.

use async_trait::async_trait;
use relayer_types::{Address, Bytes, ChainId, B256, U256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod implementations;
mod orchestrator;
pub mod revert;

pub use orchestrator::{create_orchestrator, PreparedTransaction, TransactionOrchestrator};

#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("No RPC endpoint available for chain {0}")]
	NoEndpointAvailable(ChainId),
	#[error("Chain {0} is not configured")]
	UnknownChain(ChainId),
	#[error("Invalid endpoint {url}: {reason}")]
	InvalidEndpoint { url: String, reason: String },
	/// The node answered with a JSON-RPC error, so the request was refused.
	#[error("Rejected by node: {0}")]
	Rejected(String),
	#[error("{operation} timed out after {after:?}")]
	Timeout {
		operation: &'static str,
		after: Duration,
	},
}

/// Read-only call parameters, used for gas estimation and revert replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
	pub from: Address,
	pub to: Address,
	pub data: Bytes,
	pub value: U256,
	pub gas: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
	pub hash: B256,
	pub block_number: u64,
	pub gas_used: u64,
	pub success: bool,
}

/// JSON-RPC operations against a single endpoint.
#[async_trait]
pub trait RpcInterface: Send + Sync {
	fn url(&self) -> &str;

	async fn chain_id(&self) -> Result<u64, DeliveryError>;

	/// Nonce including transactions still in the mempool.
	async fn pending_nonce(&self, address: Address) -> Result<u64, DeliveryError>;

	async fn gas_price(&self) -> Result<u128, DeliveryError>;

	async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, DeliveryError>;

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, DeliveryError>;

	async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, DeliveryError>;

	/// Call parameters of a mined or pending transaction.
	async fn transaction_call(&self, hash: B256) -> Result<Option<CallRequest>, DeliveryError>;

	/// Executes `call` read-only against state at `block`. Returns the
	/// revert message when the call reverts and `None` when it succeeds.
	async fn replay_call(&self, call: &CallRequest, block: u64) -> Result<Option<String>, DeliveryError>;
}

/// Opens [`RpcInterface`] handles for endpoint URLs.
pub trait RpcConnector: Send + Sync {
	fn connect(&self, url: &str) -> Result<Arc<dyn RpcInterface>, DeliveryError>;
}

/// Shortens a hash for log output.
pub(crate) fn truncate_hash(hash: &B256) -> String {
	let hash_str = hex::encode(hash.0);
	format!("0x{}..", &hash_str[..8])
}
