use crate::{Address, Bytes, ChainId, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully formed, unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	pub to: Address,
	pub data: Bytes,
	pub value: U256,
	pub gas_limit: u64,
	pub gas_price: u128,
	pub nonce: u64,
	pub chain_id: ChainId,
}

/// Terminal state of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxOutcome {
	/// Mined with a success status.
	Confirmed,
	/// Mined, but the called contract rejected it.
	Reverted,
	/// Broadcast, but no receipt arrived before the wait timed out.
	Pending,
	/// Never reached the network.
	SubmissionFailed,
}

/// Known families of on-chain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevertKind {
	InsufficientAllowance,
	InsufficientBalance,
	AdapterNotAuthorized,
	OutputBelowMinimum,
	DeadlineExpired,
	Unknown,
}

impl RevertKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			RevertKind::InsufficientAllowance => "insufficient allowance",
			RevertKind::InsufficientBalance => "insufficient balance",
			RevertKind::AdapterNotAuthorized => "adapter not authorized",
			RevertKind::OutputBelowMinimum => "output below minimum",
			RevertKind::DeadlineExpired => "deadline expired",
			RevertKind::Unknown => "unknown",
		}
	}
}

/// Best-effort decoded reason for a reverted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertReason {
	pub kind: RevertKind,
	/// Raw message recovered from the chain, or a placeholder when the
	/// replay produced nothing.
	pub message: String,
}

impl fmt::Display for RevertReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			RevertKind::Unknown => write!(f, "{}", self.message),
			kind => write!(f, "{} ({})", kind.as_str(), self.message),
		}
	}
}

/// Outcome of driving one transaction to settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
	/// Absent only when the transaction never reached the network.
	pub tx_hash: Option<B256>,
	pub outcome: TxOutcome,
	pub revert_reason: Option<RevertReason>,
	pub block_number: Option<u64>,
	pub gas_used: Option<u64>,
	pub error: Option<String>,
}

impl TransactionResult {
	pub fn confirmed(tx_hash: B256, block_number: u64, gas_used: u64) -> Self {
		Self {
			tx_hash: Some(tx_hash),
			outcome: TxOutcome::Confirmed,
			revert_reason: None,
			block_number: Some(block_number),
			gas_used: Some(gas_used),
			error: None,
		}
	}

	pub fn reverted(tx_hash: B256, block_number: u64, gas_used: u64, reason: RevertReason) -> Self {
		Self {
			tx_hash: Some(tx_hash),
			outcome: TxOutcome::Reverted,
			revert_reason: Some(reason),
			block_number: Some(block_number),
			gas_used: Some(gas_used),
			error: None,
		}
	}

	pub fn pending(tx_hash: B256) -> Self {
		Self {
			tx_hash: Some(tx_hash),
			outcome: TxOutcome::Pending,
			revert_reason: None,
			block_number: None,
			gas_used: None,
			error: None,
		}
	}

	pub fn submission_failed(error: impl Into<String>) -> Self {
		Self {
			tx_hash: None,
			outcome: TxOutcome::SubmissionFailed,
			revert_reason: None,
			block_number: None,
			gas_used: None,
			error: Some(error.into()),
		}
	}

	pub fn is_confirmed(&self) -> bool {
		self.outcome == TxOutcome::Confirmed
	}
}
