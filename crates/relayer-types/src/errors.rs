use crate::{ChainId, RevertReason, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable classification of an execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	Validation,
	PriceUnavailable,
	NoRouteFound,
	EncodingInvariantViolation,
	NoEndpointAvailable,
	SubmissionFailed,
	Reverted,
	Indeterminate,
	IntentExpired,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::Validation => "VALIDATION",
			ErrorKind::PriceUnavailable => "PRICE_UNAVAILABLE",
			ErrorKind::NoRouteFound => "NO_ROUTE_FOUND",
			ErrorKind::EncodingInvariantViolation => "ENCODING_INVARIANT_VIOLATION",
			ErrorKind::NoEndpointAvailable => "NO_ENDPOINT_AVAILABLE",
			ErrorKind::SubmissionFailed => "SUBMISSION_FAILED",
			ErrorKind::Reverted => "REVERTED",
			ErrorKind::Indeterminate => "INDETERMINATE",
			ErrorKind::IntentExpired => "INTENT_EXPIRED",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Classified failure of an intent execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
	/// The intent is malformed; the caller must fix its input.
	#[error("Invalid intent: {0}")]
	Validation(String),

	/// The oracle could not price one or more tokens.
	#[error("Price unavailable for {}", .symbols.join(", "))]
	PriceUnavailable { symbols: Vec<String> },

	#[error("No route found: {0}")]
	NoRouteFound(String),

	/// A programming defect, such as a recipient that is not the router.
	#[error("Encoding invariant violated: {0}")]
	EncodingInvariantViolation(String),

	/// Every configured RPC endpoint for the chain failed its probe.
	#[error("No RPC endpoint available for chain {0}")]
	NoEndpointAvailable(ChainId),

	/// Signing or broadcasting failed before the network accepted anything.
	#[error("Submission failed: {0}")]
	SubmissionFailed(String),

	#[error("Transaction {tx_hash} reverted: {reason}")]
	Reverted { tx_hash: B256, reason: RevertReason },

	/// Broadcast succeeded but no receipt arrived in time. Poll the hash;
	/// resubmitting risks executing twice.
	#[error("Transaction {tx_hash} not confirmed after {waited_secs}s; poll its status")]
	Indeterminate { tx_hash: B256, waited_secs: u64 },

	#[error("Intent expired at {deadline} (now {now})")]
	IntentExpired { deadline: u64, now: u64 },
}

impl ExecutionError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ExecutionError::Validation(_) => ErrorKind::Validation,
			ExecutionError::PriceUnavailable { .. } => ErrorKind::PriceUnavailable,
			ExecutionError::NoRouteFound(_) => ErrorKind::NoRouteFound,
			ExecutionError::EncodingInvariantViolation(_) => ErrorKind::EncodingInvariantViolation,
			ExecutionError::NoEndpointAvailable(_) => ErrorKind::NoEndpointAvailable,
			ExecutionError::SubmissionFailed(_) => ErrorKind::SubmissionFailed,
			ExecutionError::Reverted { .. } => ErrorKind::Reverted,
			ExecutionError::Indeterminate { .. } => ErrorKind::Indeterminate,
			ExecutionError::IntentExpired { .. } => ErrorKind::IntentExpired,
		}
	}

	/// Whether resubmitting the same intent later may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			ExecutionError::PriceUnavailable { .. }
				| ExecutionError::NoRouteFound(_)
				| ExecutionError::NoEndpointAvailable(_)
				| ExecutionError::SubmissionFailed(_)
		)
	}

	/// Transaction hash attached to failures that reached the network.
	pub fn tx_hash(&self) -> Option<B256> {
		match self {
			ExecutionError::Reverted { tx_hash, .. }
			| ExecutionError::Indeterminate { tx_hash, .. } => Some(*tx_hash),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::RevertKind;

	#[test]
	fn test_retryable_classification() {
		assert!(ExecutionError::PriceUnavailable {
			symbols: vec!["ETH".into()]
		}
		.is_retryable());
		assert!(ExecutionError::NoEndpointAvailable(ChainId(1)).is_retryable());
		assert!(!ExecutionError::Validation("bad".into()).is_retryable());
		assert!(!ExecutionError::EncodingInvariantViolation("recipient".into()).is_retryable());
		assert!(!ExecutionError::Indeterminate {
			tx_hash: B256::ZERO,
			waited_secs: 120
		}
		.is_retryable());
	}

	#[test]
	fn test_reverted_message_includes_reason() {
		let err = ExecutionError::Reverted {
			tx_hash: B256::ZERO,
			reason: RevertReason {
				kind: RevertKind::InsufficientAllowance,
				message: "ERC20: insufficient allowance".to_string(),
			},
		};
		assert_eq!(err.kind(), ErrorKind::Reverted);
		assert!(err.to_string().contains("insufficient allowance"));
	}

	#[test]
	fn test_kind_serializes_screaming_snake() {
		let json = serde_json::to_string(&ErrorKind::NoRouteFound).unwrap();
		assert_eq!(json, "\"NO_ROUTE_FOUND\"");
	}
}
