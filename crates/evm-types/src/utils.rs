//! String formatting helpers.
//!
//! Hex prefix stripping, truncation of long values for log and error
//! messages, and fixed-point formatting of wei amounts for display.

use alloy_primitives::U256;

/// Strips a `0x`/`0X` prefix if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Shortens `value` to at most `max` characters, keeping both ends.
///
/// Used for parameter summaries in error messages, where calldata can be
/// arbitrarily long.
pub fn truncate_middle(value: &str, max: usize) -> String {
	let len = value.chars().count();
	if len <= max || max < 5 {
		return value.to_string();
	}
	let keep = (max - 3) / 2;
	let head: String = value.chars().take(keep).collect();
	let tail: String = value.chars().skip(len - keep).collect();
	format!("{}...{}", head, tail)
}

/// Formats a raw integer amount with `decimals` fractional digits.
///
/// Trailing zeros of the fractional part are dropped, so one ether
/// (`10^18` wei, 18 decimals) renders as `"1"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
	let digits = amount.to_string();
	if decimals == 0 {
		return digits;
	}

	let places = decimals as usize;
	let (integer, fraction) = if digits.len() <= places {
		("0".to_string(), format!("{:0>width$}", digits, width = places))
	} else {
		let split = digits.len() - places;
		(digits[..split].to_string(), digits[split..].to_string())
	};

	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		integer
	} else {
		format!("{}.{}", integer, fraction)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_without_0x_prefix() {
		assert_eq!(without_0x_prefix("0Xabcd"), "abcd");
		assert_eq!(without_0x_prefix("abcd"), "abcd");
	}

	#[test]
	fn test_truncate_middle() {
		assert_eq!(truncate_middle("short", 10), "short");
		let long = "0123456789abcdefghij";
		let truncated = truncate_middle(long, 11);
		assert_eq!(truncated, "0123...ghij");
		assert!(truncated.len() <= 11);
	}

	#[test]
	fn test_format_units() {
		let one_ether = U256::from(10u64).pow(U256::from(18));
		assert_eq!(format_units(one_ether, 18), "1");
		assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u64), 18), "1.5");
		assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
		assert_eq!(format_units(U256::from(1_000u64), 0), "1000");
		assert_eq!(format_units(U256::from(2_500_000u64), 6), "2.5");
	}
}
