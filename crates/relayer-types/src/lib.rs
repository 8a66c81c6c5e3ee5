//! Common types shared across the intent relayer.
//!
//! Every crate in the workspace speaks in these types: intents and their
//! resolved on-chain form, price quotes, route candidates, transaction
//! requests and results, and the execution error taxonomy.

/// Chain identifiers.
pub mod chains;
/// Execution error taxonomy shared by every pipeline stage.
pub mod errors;
/// Events published while an intent is being executed.
pub mod events;
/// Execution reports and history records.
pub mod execution;
/// Swap intents as submitted by callers.
pub mod intent;
/// Oracle price quotes and health snapshots.
pub mod pricing;
/// Route candidates and their steps.
pub mod routes;
/// Token and chain lookups consumed by the pipeline.
pub mod tokens;
/// Transaction requests and terminal results.
pub mod transaction;

pub use alloy::primitives::{Address, Bytes, B256, U256};
pub use chains::ChainId;
pub use errors::{ErrorKind, ExecutionError};
pub use events::ExecutionEvent;
pub use execution::{ExecutionRecord, ExecutionReport, FailureRecord, QuoteSummary};
pub use intent::{FeeMode, Intent, ResolvedIntent};
pub use pricing::{OracleHealth, PriceQuote, QuoteSource};
pub use routes::{RouteCandidate, RouteStep, RouteType, StepType};
pub use tokens::{TokenInfo, TokenRegistry, NATIVE_TOKEN_ADDRESS};
pub use transaction::{RevertKind, RevertReason, Transaction, TransactionResult, TxOutcome};
