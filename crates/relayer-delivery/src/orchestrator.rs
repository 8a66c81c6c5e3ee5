use crate::implementations::evm::alloy::AlloyConnector;
use crate::revert::classify_revert;
use crate::{truncate_hash, CallRequest, DeliveryError, RpcConnector, RpcInterface};
use dashmap::DashMap;
use relayer_account::AccountService;
use relayer_config::{DeliveryConfig, RelayerConfig};
use relayer_encoding::CallEncoder;
use relayer_types::{
	Address, Bytes, ChainId, RevertKind, RevertReason, Transaction, TransactionResult, B256, U256,
	NATIVE_TOKEN_ADDRESS,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

/// A signed-ready transaction bound to the endpoint that priced it.
///
/// Holds the chain's nonce lock until it is submitted or dropped, so two
/// executions on the same chain never read the same pending nonce.
pub struct PreparedTransaction {
	pub request: Transaction,
	pub from: Address,
	endpoint: Arc<dyn RpcInterface>,
	lease: Option<OwnedMutexGuard<()>>,
}

impl PreparedTransaction {
	pub fn endpoint_url(&self) -> &str {
		self.endpoint.url()
	}

	fn call(&self) -> CallRequest {
		CallRequest {
			from: self.from,
			to: self.request.to,
			data: self.request.data.clone(),
			value: self.request.value,
			gas: Some(self.request.gas_limit),
		}
	}
}

pub struct TransactionOrchestrator {
	account: Arc<AccountService>,
	connector: Arc<dyn RpcConnector>,
	endpoints: HashMap<ChainId, Vec<String>>,
	config: DeliveryConfig,
	nonce_locks: DashMap<ChainId, Arc<Mutex<()>>>,
}

impl TransactionOrchestrator {
	pub fn new(
		account: Arc<AccountService>,
		connector: Arc<dyn RpcConnector>,
		endpoints: HashMap<ChainId, Vec<String>>,
		config: DeliveryConfig,
	) -> Self {
		Self {
			account,
			connector,
			endpoints,
			config,
			nonce_locks: DashMap::new(),
		}
	}

	/// Address of the relaying account.
	pub fn address(&self) -> Address {
		self.account.address()
	}

	/// How long [`sign_and_submit`](Self::sign_and_submit) waits for a receipt.
	pub fn receipt_timeout(&self) -> Duration {
		self.config.receipt_timeout()
	}

	/// Returns the first configured endpoint that answers the chain id probe
	/// with the expected chain.
	pub async fn resolve_endpoint(
		&self,
		chain_id: ChainId,
	) -> Result<Arc<dyn RpcInterface>, DeliveryError> {
		let urls = self
			.endpoints
			.get(&chain_id)
			.ok_or(DeliveryError::UnknownChain(chain_id))?;

		for url in urls {
			let rpc = match self.connector.connect(url) {
				Ok(rpc) => rpc,
				Err(e) => {
					warn!(chain_id = %chain_id, url = %url, error = %e, "Skipping endpoint");
					continue;
				}
			};

			match timeout(self.config.probe_timeout(), rpc.chain_id()).await {
				Ok(Ok(reported)) if reported == chain_id.0 => {
					debug!(chain_id = %chain_id, url = %url, "Endpoint is live");
					return Ok(rpc);
				}
				Ok(Ok(reported)) => {
					warn!(chain_id = %chain_id, url = %url, reported, "Endpoint serves a different chain");
				}
				Ok(Err(e)) => {
					warn!(chain_id = %chain_id, url = %url, error = %e, "Endpoint probe failed");
				}
				Err(_) => {
					warn!(
						chain_id = %chain_id,
						url = %url,
						timeout_secs = self.config.probe_timeout_secs,
						"Endpoint probe timed out"
					);
				}
			}
		}

		error!(chain_id = %chain_id, tried = urls.len(), "No RPC endpoint available");
		Err(DeliveryError::NoEndpointAvailable(chain_id))
	}

	/// Assembles a transaction calling `to` with `data`.
	///
	/// Gas is estimated against the real call. An estimation failure only
	/// means the estimate is missing, so the configured fallback limit is
	/// used instead.
	pub async fn build_transaction(
		&self,
		chain_id: ChainId,
		to: Address,
		data: Bytes,
		value: U256,
	) -> Result<PreparedTransaction, DeliveryError> {
		self.prepare(chain_id, to, data, value, None).await
	}

	async fn prepare(
		&self,
		chain_id: ChainId,
		to: Address,
		data: Bytes,
		value: U256,
		gas_limit: Option<u64>,
	) -> Result<PreparedTransaction, DeliveryError> {
		let endpoint = self.resolve_endpoint(chain_id).await?;

		let lock = self.nonce_locks.entry(chain_id).or_default().value().clone();
		let lease = lock.lock_owned().await;

		let from = self.account.address();
		let nonce = self
			.bounded("eth_getTransactionCount", endpoint.pending_nonce(from))
			.await?;
		let gas_price = self.bounded("eth_gasPrice", endpoint.gas_price()).await?;

		let gas_limit = match gas_limit {
			Some(limit) => limit,
			None => {
				let call = CallRequest {
					from,
					to,
					data: data.clone(),
					value,
					gas: None,
				};
				match self.bounded("eth_estimateGas", endpoint.estimate_gas(&call)).await {
					Ok(estimate) => self.with_buffer(estimate),
					Err(e) => {
						warn!(
							chain_id = %chain_id,
							error = %e,
							fallback = self.config.fallback_gas_limit,
							"Gas estimation failed, using fallback limit"
						);
						self.with_buffer(self.config.fallback_gas_limit)
					}
				}
			}
		};

		debug!(chain_id = %chain_id, nonce, gas_limit, gas_price, "Prepared transaction");

		Ok(PreparedTransaction {
			request: Transaction {
				to,
				data,
				value,
				gas_limit,
				gas_price,
				nonce,
				chain_id,
			},
			from,
			endpoint,
			lease: Some(lease),
		})
	}

	/// Bounds a JSON-RPC request by the configured RPC timeout.
	async fn bounded<T>(
		&self,
		operation: &'static str,
		request: impl Future<Output = Result<T, DeliveryError>>,
	) -> Result<T, DeliveryError> {
		bounded_by(operation, self.config.rpc_timeout(), request).await
	}

	fn with_buffer(&self, gas: u64) -> u64 {
		gas.saturating_add(gas.saturating_mul(self.config.gas_buffer_percent) / 100)
	}

	/// Signs, broadcasts, and waits up to the receipt timeout.
	///
	/// A result with a pending outcome carries a valid hash; the transaction
	/// may still be mined and must be polled, never resubmitted.
	pub async fn sign_and_submit(&self, prepared: PreparedTransaction) -> TransactionResult {
		self.submit(prepared, self.config.receipt_timeout()).await
	}

	async fn submit(&self, mut prepared: PreparedTransaction, wait: Duration) -> TransactionResult {
		let chain_id = prepared.request.chain_id;

		let signed = match self.account.sign(&prepared.request).await {
			Ok(signed) => signed,
			Err(e) => {
				error!(chain_id = %chain_id, error = %e, "Signing failed");
				return TransactionResult::submission_failed(e.to_string());
			}
		};

		let broadcast = self
			.bounded(
				"eth_sendRawTransaction",
				prepared.endpoint.send_raw_transaction(&signed.raw),
			)
			.await;
		let tx_hash = match broadcast {
			Ok(hash) => hash,
			Err(DeliveryError::Rejected(reason)) => {
				error!(chain_id = %chain_id, reason = %reason, "Broadcast rejected");
				return TransactionResult::submission_failed(reason);
			}
			Err(e) => {
				// The node may have accepted the transaction before the
				// connection failed; only a receipt can tell.
				warn!(
					chain_id = %chain_id,
					tx_hash = %truncate_hash(&signed.hash),
					error = %e,
					"Broadcast outcome unknown, waiting for receipt"
				);
				signed.hash
			}
		};

		// The nonce is spoken for once the transaction may be in the mempool.
		drop(prepared.lease.take());

		info!(
			chain_id = %chain_id,
			tx_hash = %truncate_hash(&tx_hash),
			nonce = prepared.request.nonce,
			"Transaction submitted"
		);

		self.await_receipt(&prepared, tx_hash, wait).await
	}

	async fn await_receipt(
		&self,
		prepared: &PreparedTransaction,
		tx_hash: B256,
		wait: Duration,
	) -> TransactionResult {
		let chain_id = prepared.request.chain_id;
		let deadline = Instant::now() + wait;

		loop {
			let limit = deadline
				.saturating_duration_since(Instant::now())
				.min(self.config.rpc_timeout());
			let poll = bounded_by(
				"eth_getTransactionReceipt",
				limit,
				prepared.endpoint.transaction_receipt(tx_hash),
			);
			match poll.await {
				Ok(Some(receipt)) if receipt.success => {
					info!(
						chain_id = %chain_id,
						tx_hash = %truncate_hash(&tx_hash),
						block = receipt.block_number,
						gas_used = receipt.gas_used,
						"Transaction confirmed"
					);
					return TransactionResult::confirmed(tx_hash, receipt.block_number, receipt.gas_used);
				}
				Ok(Some(receipt)) => {
					let reason = self
						.replay_revert(prepared.endpoint.as_ref(), &prepared.call(), receipt.block_number)
						.await;
					warn!(
						chain_id = %chain_id,
						tx_hash = %truncate_hash(&tx_hash),
						block = receipt.block_number,
						reason = %reason,
						"Transaction reverted"
					);
					return TransactionResult::reverted(
						tx_hash,
						receipt.block_number,
						receipt.gas_used,
						reason,
					);
				}
				Ok(None) => {}
				Err(e) => {
					debug!(tx_hash = %truncate_hash(&tx_hash), error = %e, "Receipt poll failed");
				}
			}

			if Instant::now() + self.config.poll_interval() > deadline {
				break;
			}
			sleep(self.config.poll_interval()).await;
		}

		warn!(
			chain_id = %chain_id,
			tx_hash = %truncate_hash(&tx_hash),
			waited_secs = wait.as_secs(),
			"No receipt before timeout"
		);
		TransactionResult::pending(tx_hash)
	}

	/// Re-executes the failed call against the block before the one it was
	/// mined in to recover the revert message.
	async fn replay_revert(
		&self,
		endpoint: &dyn RpcInterface,
		call: &CallRequest,
		mined_in: u64,
	) -> RevertReason {
		let replay = self.bounded("eth_call", endpoint.replay_call(call, mined_in.saturating_sub(1)));
		match replay.await {
			Ok(Some(message)) => classify_revert(&message),
			Ok(None) => RevertReason {
				kind: RevertKind::Unknown,
				message: "Replay succeeded; revert depends on intra-block state".to_string(),
			},
			Err(e) => RevertReason {
				kind: RevertKind::Unknown,
				message: e.to_string(),
			},
		}
	}

	/// Grants `spender` an ERC-20 allowance of `amount`.
	///
	/// Returns `None` for the native placeholder, which has no allowance.
	pub async fn approve_spending(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
		chain_id: ChainId,
	) -> Result<Option<TransactionResult>, DeliveryError> {
		if token == NATIVE_TOKEN_ADDRESS {
			debug!(chain_id = %chain_id, "Native token needs no approval");
			return Ok(None);
		}

		let data = CallEncoder::encode_approve(spender, amount);
		let prepared = self
			.prepare(
				chain_id,
				token,
				data,
				U256::ZERO,
				Some(self.config.approval_gas_limit),
			)
			.await?;

		info!(chain_id = %chain_id, token = %token, spender = %spender, "Submitting approval");
		Ok(Some(self.submit(prepared, self.config.approval_timeout()).await))
	}

	/// Looks up the current state of a previously broadcast transaction.
	pub async fn get_transaction_status(
		&self,
		tx_hash: B256,
		chain_id: ChainId,
	) -> Result<TransactionResult, DeliveryError> {
		let endpoint = self.resolve_endpoint(chain_id).await?;

		let receipt = match self
			.bounded("eth_getTransactionReceipt", endpoint.transaction_receipt(tx_hash))
			.await?
		{
			Some(receipt) => receipt,
			None => return Ok(TransactionResult::pending(tx_hash)),
		};

		if receipt.success {
			return Ok(TransactionResult::confirmed(
				tx_hash,
				receipt.block_number,
				receipt.gas_used,
			));
		}

		let reason = match self
			.bounded("eth_getTransactionByHash", endpoint.transaction_call(tx_hash))
			.await?
		{
			Some(call) => {
				self.replay_revert(endpoint.as_ref(), &call, receipt.block_number)
					.await
			}
			None => RevertReason {
				kind: RevertKind::Unknown,
				message: "Transaction body unavailable".to_string(),
			},
		};

		Ok(TransactionResult::reverted(
			tx_hash,
			receipt.block_number,
			receipt.gas_used,
			reason,
		))
	}
}

async fn bounded_by<T>(
	operation: &'static str,
	limit: Duration,
	request: impl Future<Output = Result<T, DeliveryError>>,
) -> Result<T, DeliveryError> {
	match timeout(limit, request).await {
		Ok(result) => result,
		Err(_) => Err(DeliveryError::Timeout {
			operation,
			after: limit,
		}),
	}
}

/// Builds an orchestrator over HTTP endpoints from the chain configuration.
pub fn create_orchestrator(
	config: &RelayerConfig,
	account: Arc<AccountService>,
) -> TransactionOrchestrator {
	let endpoints = config
		.chains
		.iter()
		.map(|(chain_id, chain)| (*chain_id, chain.rpc_urls.clone()))
		.collect();

	TransactionOrchestrator::new(
		account,
		Arc::new(AlloyConnector),
		endpoints,
		config.delivery.clone(),
	)
}
