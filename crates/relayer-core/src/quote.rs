/// Basis points in one whole.
const BPS_DENOMINATOR: f64 = 10_000.0;

/// Output estimate for `amount_in` at the given USD prices, after the
/// slippage haircut.
///
/// `slippage_bps` has to match the slippage constant of the deployed
/// adapters. An estimate computed with a looser haircut than the adapter
/// enforces looks executable here and then reverts on-chain.
pub fn quote_output(amount_in: f64, price_in: f64, price_out: f64, slippage_bps: u32) -> f64 {
	let gross = amount_in * price_in / price_out;
	gross * (1.0 - f64::from(slippage_bps) / BPS_DENOMINATOR)
}
