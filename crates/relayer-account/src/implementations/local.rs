//! Local private key wallet.

use crate::{AccountError, AccountInterface, SignedTransaction};
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSigner;
use alloy::primitives::TxKind;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use relayer_types::{Address, Transaction};

/// Wallet holding the relayer's key in memory.
///
/// Produces EIP-155 legacy transactions, which every supported chain accepts.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded key, with or without `0x`.
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError> {
		let mut legacy_tx = TxLegacy {
			chain_id: Some(tx.chain_id.0),
			nonce: tx.nonce,
			gas_price: tx.gas_price,
			gas_limit: tx.gas_limit,
			to: TxKind::Call(tx.to),
			value: tx.value,
			input: tx.data.clone(),
		};

		let signature = self
			.signer
			.sign_transaction(&mut legacy_tx)
			.await
			.map_err(|e| AccountError::SigningFailed(format!("Failed to sign transaction: {}", e)))?;

		let signed = legacy_tx.into_signed(signature);
		let hash = *signed.hash();
		let envelope = TxEnvelope::from(signed);

		Ok(SignedTransaction {
			raw: envelope.encoded_2718().into(),
			hash,
		})
	}
}

/// Creates the account provider for the configured private key.
pub fn create_account(private_key: &str) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(LocalWallet::new(private_key)?))
}
