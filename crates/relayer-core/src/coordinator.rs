use crate::clock::{Clock, SystemClock};
use crate::event_bus::EventBus;
use crate::history::HistoryRecorder;
use crate::quote::quote_output;
use chrono::Utc;
use relayer_config::ExecutionConfig;
use relayer_delivery::{DeliveryError, TransactionOrchestrator};
use relayer_encoding::{to_base_units, CallEncoder, EncodingError};
use relayer_oracle::PriceOracleClient;
use relayer_routing::RoutePlanner;
use relayer_types::{
	Address, ChainId, ExecutionError, ExecutionEvent, ExecutionRecord, ExecutionReport, FailureRecord,
	FeeMode, Intent, PriceQuote, QuoteSummary, ResolvedIntent, RevertKind, RevertReason, TokenInfo,
	TokenRegistry, TransactionResult, TxOutcome, U256,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Partial results collected while an execution runs, kept for the audit
/// record whether or not the execution succeeds.
#[derive(Default)]
struct Progress {
	quote: Option<QuoteSummary>,
	route_id: Option<String>,
	transaction: Option<TransactionResult>,
}

/// Runs intents through quote, route, encode, and submit.
pub struct ExecutionCoordinator {
	registry: Arc<dyn TokenRegistry>,
	oracle: Arc<PriceOracleClient>,
	planner: Arc<RoutePlanner>,
	encoder: Arc<CallEncoder>,
	orchestrator: Arc<TransactionOrchestrator>,
	settings: ExecutionConfig,
	clock: Arc<dyn Clock>,
	events: EventBus,
	history: Option<Arc<dyn HistoryRecorder>>,
}

impl ExecutionCoordinator {
	pub fn new(
		registry: Arc<dyn TokenRegistry>,
		oracle: Arc<PriceOracleClient>,
		planner: Arc<RoutePlanner>,
		encoder: Arc<CallEncoder>,
		orchestrator: Arc<TransactionOrchestrator>,
		settings: ExecutionConfig,
	) -> Self {
		Self {
			registry,
			oracle,
			planner,
			encoder,
			orchestrator,
			settings,
			clock: Arc::new(SystemClock),
			events: EventBus::default(),
			history: None,
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn with_event_bus(mut self, events: EventBus) -> Self {
		self.events = events;
		self
	}

	pub fn with_history(mut self, history: Arc<dyn HistoryRecorder>) -> Self {
		self.history = Some(history);
		self
	}

	pub fn oracle(&self) -> &Arc<PriceOracleClient> {
		&self.oracle
	}

	pub fn orchestrator(&self) -> &Arc<TransactionOrchestrator> {
		&self.orchestrator
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	pub fn history(&self) -> Option<&Arc<dyn HistoryRecorder>> {
		self.history.as_ref()
	}

	/// Executes one intent to a terminal outcome.
	///
	/// Every call publishes a `Completed` or `Failed` event and hands an
	/// [`ExecutionRecord`] to the history recorder.
	pub async fn execute(&self, intent: Intent) -> Result<ExecutionReport, ExecutionError> {
		let execution_id = Uuid::new_v4().to_string();
		let started_at = Utc::now();
		let mut progress = Progress::default();

		info!(
			execution_id = %execution_id,
			token_in = %intent.token_in,
			token_out = %intent.token_out,
			source_chain = %intent.source_chain_id,
			destination_chain = %intent.destination_chain_id,
			"Executing intent"
		);

		let result = self.run(&execution_id, &intent, &mut progress).await;

		match &result {
			Ok(report) => {
				if let (Some(tx_hash), Some(block_number)) =
					(report.transaction.tx_hash, report.transaction.block_number)
				{
					self.publish(ExecutionEvent::Completed {
						execution_id: execution_id.clone(),
						tx_hash,
						block_number,
					});
				}
				info!(execution_id = %execution_id, route_id = %report.route.route_id, "Intent executed");
			}
			Err(e) => {
				if matches!(
					e,
					ExecutionError::EncodingInvariantViolation(_) | ExecutionError::Reverted { .. }
				) {
					error!(execution_id = %execution_id, kind = %e.kind(), error = %e, "Execution failed");
				} else {
					warn!(
						execution_id = %execution_id,
						kind = %e.kind(),
						retryable = e.is_retryable(),
						error = %e,
						"Execution failed"
					);
				}
				self.publish(ExecutionEvent::Failed {
					execution_id: execution_id.clone(),
					kind: e.kind(),
					message: e.to_string(),
				});
			}
		}

		self.record(ExecutionRecord {
			execution_id,
			intent,
			started_at,
			finished_at: Utc::now(),
			quote: progress.quote,
			route_id: progress.route_id,
			transaction: progress.transaction,
			failure: result.as_ref().err().map(FailureRecord::from),
		})
		.await;

		result
	}

	async fn run(
		&self,
		execution_id: &str,
		intent: &Intent,
		progress: &mut Progress,
	) -> Result<ExecutionReport, ExecutionError> {
		intent.validate(self.clock.now())?;
		let (token_in, token_out, fee_token) = self.resolve_tokens(intent)?;

		let quote = self
			.quote(intent, &token_in, &token_out, &fee_token)
			.await?;
		progress.quote = Some(quote.clone());
		self.publish(ExecutionEvent::Quoted {
			execution_id: execution_id.to_string(),
			quoted_out: quote.quoted_out,
		});

		let resolved = ResolvedIntent {
			amount_in: base_units(intent.amount_in, &token_in)?,
			min_amount_out: base_units(intent.min_amount_out, &token_out)?,
			fee_cap: base_units(intent.fee_cap, &fee_token)?,
			intent: intent.clone(),
			token_in,
			token_out,
			fee_token,
		};

		let route = self.planner.get_best_route(&resolved).await.ok_or_else(|| {
			ExecutionError::NoRouteFound(format!(
				"no candidate from chain {} to chain {}",
				intent.source_chain_id, intent.destination_chain_id
			))
		})?;
		progress.route_id = Some(route.route_id.clone());
		self.publish(ExecutionEvent::RoutePlanned {
			execution_id: execution_id.to_string(),
			route_id: route.route_id.clone(),
			fallback: route.is_fallback(),
		});
		debug!(execution_id, route_id = %route.route_id, explanation = %route.explanation, "Route selected");

		let source = intent.source_chain_id;
		let router = self.registry.router(source).ok_or_else(|| {
			ExecutionError::EncodingInvariantViolation(format!("no router configured for chain {}", source))
		})?;
		let encoded = self
			.encoder
			.encode_route(&resolved, &route, router)
			.map_err(|e| encoding_failure(execution_id, e))?;

		if self.settings.approve_input_token {
			// An approval spends gas, so an expired intent stops here.
			self.ensure_not_expired(intent)?;
			self.approve_input(&resolved, encoded.router).await;
		}

		let value = if resolved.token_in.is_native() {
			resolved.amount_in
		} else {
			U256::ZERO
		};
		let prepared = self
			.orchestrator
			.build_transaction(source, encoded.router, encoded.router_call, value)
			.await
			.map_err(delivery_failure)?;

		self.ensure_not_expired(intent)?;

		let transaction = self.orchestrator.sign_and_submit(prepared).await;
		progress.transaction = Some(transaction.clone());
		if let Some(tx_hash) = transaction.tx_hash {
			self.publish(ExecutionEvent::Submitted {
				execution_id: execution_id.to_string(),
				tx_hash,
			});
		}

		self.classify(transaction).map(|transaction| ExecutionReport {
			execution_id: execution_id.to_string(),
			quote,
			route,
			transaction,
		})
	}

	/// Resolves tokenIn on the source chain, tokenOut on the destination
	/// chain, and the fee token selected by the fee mode.
	fn resolve_tokens(
		&self,
		intent: &Intent,
	) -> Result<(TokenInfo, TokenInfo, TokenInfo), ExecutionError> {
		let source = intent.source_chain_id;
		let destination = intent.destination_chain_id;

		for chain_id in [source, destination] {
			if !self.registry.has_chain(chain_id) {
				return Err(ExecutionError::Validation(format!(
					"chain {} is not configured",
					chain_id
				)));
			}
		}

		let token_in = self.token(source, &intent.token_in)?;
		let token_out = self.token(destination, &intent.token_out)?;

		let fee_token = match intent.fee_mode {
			FeeMode::Input => token_in.clone(),
			FeeMode::Output => token_out.clone(),
			FeeMode::Native => {
				let symbol = self.registry.native_symbol(source).unwrap_or_default();
				self.token(source, &symbol)?
			}
			FeeMode::Stable => {
				let symbol = self.registry.stable_symbol(source).unwrap_or_default();
				self.token(source, &symbol)?
			}
		};

		Ok((token_in, token_out, fee_token))
	}

	fn token(&self, chain_id: ChainId, token: &str) -> Result<TokenInfo, ExecutionError> {
		self.registry.resolve_token(chain_id, token).ok_or_else(|| {
			ExecutionError::Validation(format!("token {} is not configured on chain {}", token, chain_id))
		})
	}

	async fn quote(
		&self,
		intent: &Intent,
		token_in: &TokenInfo,
		token_out: &TokenInfo,
		fee_token: &TokenInfo,
	) -> Result<QuoteSummary, ExecutionError> {
		let (quote_in, quote_out, quote_fee) = tokio::join!(
			self.oracle.get_price(&token_in.symbol, token_in.chain_id),
			self.oracle.get_price(&token_out.symbol, token_out.chain_id),
			self.oracle.get_price(&fee_token.symbol, fee_token.chain_id),
		);

		let (Some(price_in), Some(price_out), Some(fee_token_price)) = (
			quote_in.usable_price(),
			quote_out.usable_price(),
			quote_fee.usable_price(),
		) else {
			let mut symbols: Vec<String> = Vec::new();
			for quote in [&quote_in, &quote_out, &quote_fee] {
				if !quote.is_available() && !symbols.contains(&quote.symbol) {
					symbols.push(quote.symbol.clone());
				}
			}
			error!(symbols = ?symbols, "Price unavailable, refusing to quote");
			return Err(ExecutionError::PriceUnavailable { symbols });
		};

		let amount_in = intent.amount_in.to_f64().ok_or_else(|| {
			ExecutionError::Validation(format!("amountIn {} is not representable", intent.amount_in))
		})?;
		let quoted_out = quote_output(amount_in, price_in, price_out, self.settings.slippage_bps);

		if intent.min_amount_out.to_f64().is_some_and(|min| quoted_out < min) {
			warn!(
				quoted_out,
				min_amount_out = %intent.min_amount_out,
				slippage_bps = self.settings.slippage_bps,
				"Quote is below the intent minimum; the adapter will likely revert"
			);
		}

		Ok(QuoteSummary {
			price_in,
			price_out,
			fee_token_price,
			slippage_bps: self.settings.slippage_bps,
			quoted_out,
			stale: is_stale(&[&quote_in, &quote_out, &quote_fee]),
		})
	}

	fn ensure_not_expired(&self, intent: &Intent) -> Result<(), ExecutionError> {
		let now = self.clock.now();
		if now >= intent.deadline {
			return Err(ExecutionError::IntentExpired {
				deadline: intent.deadline,
				now,
			});
		}
		Ok(())
	}

	/// Approval failures are logged only. An existing allowance may still
	/// cover the swap.
	async fn approve_input(&self, intent: &ResolvedIntent, spender: Address) {
		let chain_id = intent.intent.source_chain_id;
		match self
			.orchestrator
			.approve_spending(intent.token_in.address, spender, intent.amount_in, chain_id)
			.await
		{
			Ok(Some(result)) if result.is_confirmed() => {
				info!(chain_id = %chain_id, token = %intent.token_in.symbol, "Input token approved")
			}
			Ok(Some(result)) => warn!(
				chain_id = %chain_id,
				token = %intent.token_in.symbol,
				outcome = ?result.outcome,
				"Approval did not confirm, continuing with swap"
			),
			Ok(None) => {}
			Err(e) => warn!(
				chain_id = %chain_id,
				token = %intent.token_in.symbol,
				error = %e,
				"Approval failed, continuing with swap"
			),
		}
	}

	fn classify(&self, transaction: TransactionResult) -> Result<TransactionResult, ExecutionError> {
		match (transaction.outcome, transaction.tx_hash) {
			(TxOutcome::Confirmed, _) => Ok(transaction),
			(TxOutcome::Reverted, Some(tx_hash)) => Err(ExecutionError::Reverted {
				tx_hash,
				reason: transaction.revert_reason.unwrap_or_else(|| RevertReason {
					kind: RevertKind::Unknown,
					message: "no reason recovered".to_string(),
				}),
			}),
			(TxOutcome::Pending, Some(tx_hash)) => Err(ExecutionError::Indeterminate {
				tx_hash,
				waited_secs: self.orchestrator.receipt_timeout().as_secs(),
			}),
			_ => Err(ExecutionError::SubmissionFailed(
				transaction
					.error
					.unwrap_or_else(|| "transaction was not broadcast".to_string()),
			)),
		}
	}

	fn publish(&self, event: ExecutionEvent) {
		// No subscribers is normal for one-shot CLI runs.
		let _ = self.events.publish(event);
	}

	async fn record(&self, record: ExecutionRecord) {
		let Some(history) = &self.history else {
			return;
		};
		if let Err(e) = history.record(&record).await {
			warn!(execution_id = %record.execution_id, error = %e, "Failed to record execution");
		}
	}
}

fn base_units(amount: Decimal, token: &TokenInfo) -> Result<U256, ExecutionError> {
	to_base_units(amount, token.decimals).map_err(|e| {
		ExecutionError::Validation(format!("{} amount {}: {}", token.symbol, amount, e))
	})
}

fn is_stale(quotes: &[&PriceQuote]) -> bool {
	quotes.iter().any(|quote| quote.stale)
}

fn encoding_failure(execution_id: &str, error: EncodingError) -> ExecutionError {
	error!(execution_id, error = %error, "Refusing to encode route");
	ExecutionError::EncodingInvariantViolation(error.to_string())
}

fn delivery_failure(error: DeliveryError) -> ExecutionError {
	match error {
		DeliveryError::NoEndpointAvailable(chain_id) => ExecutionError::NoEndpointAvailable(chain_id),
		DeliveryError::UnknownChain(chain_id) => {
			ExecutionError::Validation(format!("chain {} has no RPC endpoints", chain_id))
		}
		e => ExecutionError::SubmissionFailed(e.to_string()),
	}
}
