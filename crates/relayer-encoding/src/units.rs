//! Conversion between human-readable amounts and token base units.

use crate::EncodingError;
use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Converts `amount` to base units of a token with `decimals` decimals.
///
/// Digits beyond the token's precision are truncated toward zero.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, EncodingError> {
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(EncodingError::NegativeAmount(amount.to_string()));
	}

	let overflow = || EncodingError::AmountOverflow {
		amount: amount.to_string(),
		decimals,
	};

	let mantissa = U256::from(amount.mantissa().unsigned_abs());
	let scale = amount.scale();
	let decimals = u32::from(decimals);

	if decimals >= scale {
		let factor = pow10(decimals - scale).ok_or_else(overflow)?;
		mantissa.checked_mul(factor).ok_or_else(overflow)
	} else {
		let divisor = pow10(scale - decimals).ok_or_else(overflow)?;
		Ok(mantissa / divisor)
	}
}

fn pow10(exponent: u32) -> Option<U256> {
	U256::from(10u64).checked_pow(U256::from(exponent))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dec(s: &str) -> Decimal {
		s.parse().unwrap()
	}

	#[test]
	fn test_six_and_eighteen_decimals_differ_by_exactly_1e12() {
		let six = to_base_units(dec("1.0"), 6).unwrap();
		let eighteen = to_base_units(dec("1.0"), 18).unwrap();

		assert_eq!(six, U256::from(1_000_000u64));
		assert_eq!(eighteen, U256::from(1_000_000_000_000_000_000u64));
		assert_eq!(eighteen / six, U256::from(1_000_000_000_000u64));
		assert_eq!(eighteen % six, U256::ZERO);
	}

	#[test]
	fn test_fractional_amounts() {
		assert_eq!(to_base_units(dec("0.001"), 18).unwrap(), U256::from(1_000_000_000_000_000u64));
		assert_eq!(to_base_units(dec("6.2409"), 6).unwrap(), U256::from(6_240_900u64));
		assert_eq!(to_base_units(dec("12.5"), 0).unwrap(), U256::from(12u64));
	}

	#[test]
	fn test_excess_precision_truncates() {
		assert_eq!(to_base_units(dec("1.2345678"), 6).unwrap(), U256::from(1_234_567u64));
	}

	#[test]
	fn test_negative_rejected() {
		assert!(matches!(
			to_base_units(dec("-1"), 6),
			Err(EncodingError::NegativeAmount(_))
		));
	}

	#[test]
	fn test_large_decimals() {
		let value = to_base_units(dec("79228162514264337593543950335"), 36).unwrap();
		assert!(value > U256::from(u128::MAX));
	}
}
