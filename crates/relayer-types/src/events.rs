use crate::{ErrorKind, B256};
use serde::{Deserialize, Serialize};

/// Progress notifications published by the execution coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ExecutionEvent {
	Quoted {
		execution_id: String,
		quoted_out: f64,
	},
	RoutePlanned {
		execution_id: String,
		route_id: String,
		fallback: bool,
	},
	Submitted {
		execution_id: String,
		tx_hash: B256,
	},
	Completed {
		execution_id: String,
		tx_hash: B256,
		block_number: u64,
	},
	Failed {
		execution_id: String,
		kind: ErrorKind,
		message: String,
	},
}

impl ExecutionEvent {
	pub fn execution_id(&self) -> &str {
		match self {
			ExecutionEvent::Quoted { execution_id, .. }
			| ExecutionEvent::RoutePlanned { execution_id, .. }
			| ExecutionEvent::Submitted { execution_id, .. }
			| ExecutionEvent::Completed { execution_id, .. }
			| ExecutionEvent::Failed { execution_id, .. } => execution_id,
		}
	}
}
