//! Audit trail of finished executions.

use async_trait::async_trait;
use relayer_storage::{StorageError, StorageService};
use relayer_types::ExecutionRecord;
use std::sync::Arc;

/// Storage namespace holding one record per execution id.
pub const EXECUTIONS_NAMESPACE: &str = "executions";

#[async_trait]
pub trait HistoryRecorder: Send + Sync {
	async fn record(&self, record: &ExecutionRecord) -> Result<(), StorageError>;

	async fn get(&self, execution_id: &str) -> Result<ExecutionRecord, StorageError>;

	/// All records, oldest first.
	async fn list(&self) -> Result<Vec<ExecutionRecord>, StorageError>;
}

pub struct StorageHistoryRecorder {
	storage: Arc<StorageService>,
}

impl StorageHistoryRecorder {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}
}

#[async_trait]
impl HistoryRecorder for StorageHistoryRecorder {
	async fn record(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
		self.storage
			.store(EXECUTIONS_NAMESPACE, &record.execution_id, record)
			.await
	}

	async fn get(&self, execution_id: &str) -> Result<ExecutionRecord, StorageError> {
		self.storage
			.retrieve(EXECUTIONS_NAMESPACE, execution_id)
			.await
	}

	async fn list(&self) -> Result<Vec<ExecutionRecord>, StorageError> {
		let mut records: Vec<ExecutionRecord> = self
			.storage
			.retrieve_all(EXECUTIONS_NAMESPACE)
			.await?
			.into_iter()
			.map(|(_, record)| record)
			.collect();
		records.sort_by_key(|record| record.started_at);
		Ok(records)
	}
}
