//! Key-value persistence for execution history.
//!
//! Keys are `namespace:id`. Values are stored as JSON through
//! [`StorageService`]; backends only see bytes.

use async_trait::async_trait;
use relayer_config::{StorageBackend, StorageConfig};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Raw byte storage implemented by each backend.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Ids stored under `namespace`, in no particular order.
	async fn list(&self, namespace: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed JSON access over a [`StorageInterface`] backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key(namespace, id), bytes).await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&key(namespace, id)).await
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&key(namespace, id)).await
	}

	/// Loads every value in `namespace`. Entries that no longer parse are
	/// skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<(String, T)>, StorageError> {
		let mut values = Vec::new();
		for id in self.backend.list(namespace).await? {
			match self.retrieve(namespace, &id).await {
				Ok(value) => values.push((id, value)),
				Err(StorageError::Serialization(e)) => {
					tracing::warn!(namespace, id = %id, error = %e, "Skipping unreadable entry");
				}
				Err(StorageError::NotFound) => {}
				Err(e) => return Err(e),
			}
		}
		Ok(values)
	}
}

fn key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// Builds the backend selected in configuration.
pub fn create_storage(config: &StorageConfig) -> Box<dyn StorageInterface> {
	match config.backend {
		StorageBackend::Memory => Box::new(MemoryStorage::new()),
		StorageBackend::File => Box::new(FileStorage::new(config.path.clone())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Entry {
		value: u64,
	}

	#[tokio::test]
	async fn test_typed_round_trip() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		storage.store("entries", "a", &Entry { value: 1 }).await.unwrap();

		let entry: Entry = storage.retrieve("entries", "a").await.unwrap();
		assert_eq!(entry, Entry { value: 1 });
		assert!(storage.exists("entries", "a").await.unwrap());
	}

	#[tokio::test]
	async fn test_missing_value() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		let result: Result<Entry, _> = storage.retrieve("entries", "missing").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_retrieve_all_is_scoped_to_namespace() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		storage.store("entries", "a", &Entry { value: 1 }).await.unwrap();
		storage.store("entries", "b", &Entry { value: 2 }).await.unwrap();
		storage.store("other", "c", &Entry { value: 3 }).await.unwrap();

		let mut all: Vec<(String, Entry)> = storage.retrieve_all("entries").await.unwrap();
		all.sort_by(|a, b| a.0.cmp(&b.0));
		assert_eq!(all.len(), 2);
		assert_eq!(all[1], ("b".to_string(), Entry { value: 2 }));
	}

	#[test]
	fn test_factory_selects_backend() {
		let config = StorageConfig::default();
		assert_eq!(config.backend, StorageBackend::Memory);
		let _ = create_storage(&config);
	}
}
