//! Signing key provider for the relaying account.
//!
//! Transactions are signed locally and handed to delivery as raw bytes,
//! so the RPC endpoints never see the key.

use async_trait::async_trait;
use relayer_types::{Address, Bytes, Transaction, B256};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

pub use implementations::local::{create_account, LocalWallet};

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// A transaction signed and encoded for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub raw: Bytes,
	pub hash: B256,
}

#[async_trait]
pub trait AccountInterface: Send + Sync {
	fn address(&self) -> Address;
	async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError>;
}

pub struct AccountService {
	provider: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(provider: Box<dyn AccountInterface>) -> Self {
		Self { provider }
	}

	pub fn address(&self) -> Address {
		self.provider.address()
	}

	pub async fn sign(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError> {
		self.provider.sign_transaction(tx).await
	}
}
