//! Intent execution pipeline.
//!
//! [`ExecutionCoordinator`] runs one intent through validation, pricing,
//! route selection, encoding, and submission, and reports either an
//! [`ExecutionReport`](relayer_types::ExecutionReport) or a classified
//! [`ExecutionError`](relayer_types::ExecutionError).

use thiserror::Error;

pub mod builder;
pub mod clock;
pub mod coordinator;
pub mod event_bus;
pub mod history;
pub mod quote;

pub use builder::RelayerBuilder;
pub use clock::{Clock, SystemClock};
pub use coordinator::ExecutionCoordinator;
pub use event_bus::EventBus;
pub use history::{HistoryRecorder, StorageHistoryRecorder, EXECUTIONS_NAMESPACE};
pub use quote::quote_output;

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Configuration(String),
	#[error("Service initialization error: {0}")]
	ServiceInit(String),
}
