//! JSON-RPC access to EVM chains using Alloy.

use crate::{CallRequest, DeliveryError, ReceiptSummary, RpcConnector, RpcInterface};
use alloy::consensus::Transaction as _;
use alloy::eips::BlockId;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use relayer_types::{Address, Bytes, B256};
use std::sync::Arc;
use tracing::debug;

/// One HTTP JSON-RPC endpoint.
pub struct AlloyRpc {
	url: String,
	provider: RootProvider<Ethereum>,
}

impl AlloyRpc {
	pub fn new(url: &str) -> Result<Self, DeliveryError> {
		let parsed = url.parse().map_err(|e| DeliveryError::InvalidEndpoint {
			url: url.to_string(),
			reason: format!("{}", e),
		})?;

		Ok(Self {
			url: url.to_string(),
			provider: RootProvider::new_http(parsed),
		})
	}

	fn to_request(call: &CallRequest) -> TransactionRequest {
		let request = TransactionRequest::default()
			.with_from(call.from)
			.with_to(call.to)
			.with_input(call.data.clone())
			.with_value(call.value);

		match call.gas {
			Some(gas) => request.with_gas_limit(gas),
			None => request,
		}
	}
}

#[async_trait]
impl RpcInterface for AlloyRpc {
	fn url(&self) -> &str {
		&self.url
	}

	async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain ID: {}", e)))
	}

	async fn pending_nonce(&self, address: Address) -> Result<u64, DeliveryError> {
		self.provider
			.get_transaction_count(address)
			.pending()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get gas price: {}", e)))
	}

	async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, DeliveryError> {
		self.provider
			.estimate_gas(Self::to_request(call))
			.await
			.map_err(|e| DeliveryError::Network(format!("Gas estimation failed: {}", e)))
	}

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, DeliveryError> {
		let pending = self
			.provider
			.send_raw_transaction(raw)
			.await
			.map_err(|e| match e.as_error_resp() {
				Some(payload) => DeliveryError::Rejected(payload.message.to_string()),
				None => DeliveryError::Network(format!("Failed to send transaction: {}", e)),
			})?;

		Ok(*pending.tx_hash())
	}

	async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, DeliveryError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok(receipt.map(|receipt| ReceiptSummary {
			hash: receipt.transaction_hash,
			block_number: receipt.block_number.unwrap_or(0),
			gas_used: receipt.gas_used,
			success: receipt.status(),
		}))
	}

	async fn transaction_call(&self, hash: B256) -> Result<Option<CallRequest>, DeliveryError> {
		let tx = self
			.provider
			.get_transaction_by_hash(hash)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get transaction: {}", e)))?;

		Ok(tx.and_then(|tx| {
			let to = tx.to()?;
			Some(CallRequest {
				from: tx.inner.signer(),
				to,
				data: tx.input().clone(),
				value: tx.value(),
				gas: Some(tx.gas_limit()),
			})
		}))
	}

	async fn replay_call(&self, call: &CallRequest, block: u64) -> Result<Option<String>, DeliveryError> {
		let result = self
			.provider
			.call(Self::to_request(call))
			.block(BlockId::number(block))
			.await;

		match result {
			Ok(_) => Ok(None),
			Err(e) => match e.as_error_resp() {
				Some(payload) => {
					let decoded = payload
						.as_revert_data()
						.and_then(|data| alloy::sol_types::decode_revert_reason(&data));
					debug!(block, decoded = ?decoded, "Replayed reverted call");
					Ok(Some(decoded.unwrap_or_else(|| payload.message.to_string())))
				}
				None => Err(DeliveryError::Network(format!("Replay failed: {}", e))),
			},
		}
	}
}

/// Connects to endpoints over HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlloyConnector;

impl RpcConnector for AlloyConnector {
	fn connect(&self, url: &str) -> Result<Arc<dyn RpcInterface>, DeliveryError> {
		Ok(Arc::new(AlloyRpc::new(url)?))
	}
}
