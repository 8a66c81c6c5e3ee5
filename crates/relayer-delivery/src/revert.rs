//! Classification of revert messages.
//!
//! Reverts carry free-form strings, so this is substring matching over
//! messages produced by common ERC-20 implementations, DEX routers, and
//! the router contract. Anything unrecognized is reported verbatim.

use relayer_types::{RevertKind, RevertReason};

const PATTERNS: &[(RevertKind, &[&str])] = &[
	(RevertKind::InsufficientAllowance, &["allowance"]),
	(
		RevertKind::InsufficientBalance,
		&["exceeds balance", "insufficient balance", "insufficient funds"],
	),
	(
		RevertKind::AdapterNotAuthorized,
		&["not whitelisted", "not authorized", "unauthorized", "adapter not allowed"],
	),
	(
		RevertKind::OutputBelowMinimum,
		&[
			"insufficient output",
			"too little received",
			"below minimum",
			"insufficient_output_amount",
			"slippage",
		],
	),
	(RevertKind::DeadlineExpired, &["deadline", "expired"]),
];

pub fn classify_revert(message: &str) -> RevertReason {
	let lowered = message.to_lowercase();
	let kind = PATTERNS
		.iter()
		.find(|(_, needles)| needles.iter().any(|needle| lowered.contains(needle)))
		.map(|(kind, _)| *kind)
		.unwrap_or(RevertKind::Unknown);

	RevertReason {
		kind,
		message: message.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_known_messages() {
		let cases = [
			("ERC20: insufficient allowance", RevertKind::InsufficientAllowance),
			("ERC20: transfer amount exceeds allowance", RevertKind::InsufficientAllowance),
			("ERC20: transfer amount exceeds balance", RevertKind::InsufficientBalance),
			("Adapter not whitelisted", RevertKind::AdapterNotAuthorized),
			("Insufficient output", RevertKind::OutputBelowMinimum),
			("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT", RevertKind::OutputBelowMinimum),
			("Too little received", RevertKind::OutputBelowMinimum),
			("Transaction too old: deadline passed", RevertKind::DeadlineExpired),
		];
		for (message, kind) in cases {
			assert_eq!(classify_revert(message).kind, kind, "{}", message);
		}
	}

	#[test]
	fn test_unknown_message_kept_verbatim() {
		let reason = classify_revert("Pausable: paused");
		assert_eq!(reason.kind, RevertKind::Unknown);
		assert_eq!(reason.message, "Pausable: paused");
	}
}
