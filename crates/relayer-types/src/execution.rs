use crate::{ErrorKind, ExecutionError, Intent, RouteCandidate, TransactionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prices and arithmetic behind an execution's quoted output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
	pub price_in: f64,
	pub price_out: f64,
	pub fee_token_price: f64,
	pub slippage_bps: u32,
	/// Expected output in human units of the output token.
	pub quoted_out: f64,
	/// Whether any of the prices came from a stale feed or cache.
	pub stale: bool,
}

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
	pub execution_id: String,
	pub quote: QuoteSummary,
	pub route: RouteCandidate,
	pub transaction: TransactionResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
	pub kind: ErrorKind,
	pub message: String,
	pub retryable: bool,
}

impl From<&ExecutionError> for FailureRecord {
	fn from(error: &ExecutionError) -> Self {
		Self {
			kind: error.kind(),
			message: error.to_string(),
			retryable: error.is_retryable(),
		}
	}
}

/// Audit record handed to the history recorder after every execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
	pub execution_id: String,
	pub intent: Intent,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
	pub quote: Option<QuoteSummary>,
	pub route_id: Option<String>,
	pub transaction: Option<TransactionResult>,
	pub failure: Option<FailureRecord>,
}

impl ExecutionRecord {
	pub fn succeeded(&self) -> bool {
		self.failure.is_none()
	}
}
