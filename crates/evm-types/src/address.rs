//! Address and hash parsing.
//!
//! Addresses are accepted with or without a `0x` prefix. All-lowercase and
//! all-uppercase inputs are taken as-is; mixed-case inputs must carry a
//! valid EIP-55 checksum. Output formatting always uses the checksummed
//! form (`Address`'s `Display`).

use crate::{utils::without_0x_prefix, TypeError};
use alloy_primitives::{Address, B256};
use std::str::FromStr;

/// Parses and validates a 20-byte address.
pub fn parse_address(input: &str) -> Result<Address, TypeError> {
	let trimmed = input.trim();
	let hex_part = without_0x_prefix(trimmed);

	if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(TypeError::InvalidAddress(input.to_string()));
	}

	let address =
		Address::from_str(hex_part).map_err(|_| TypeError::InvalidAddress(input.to_string()))?;

	let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
	let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
	if has_lower && has_upper {
		let checksummed = address.to_checksum(None);
		if without_0x_prefix(&checksummed) != hex_part {
			return Err(TypeError::InvalidAddress(input.to_string()));
		}
	}

	Ok(address)
}

/// Returns true when the input would be accepted by [`parse_address`].
pub fn is_address(input: &str) -> bool {
	parse_address(input).is_ok()
}

/// Parses a 32-byte hash from hex.
pub fn parse_hash(input: &str) -> Result<B256, TypeError> {
	let hex_part = without_0x_prefix(input.trim());
	if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(TypeError::InvalidHash(input.to_string()));
	}
	B256::from_str(hex_part).map_err(|_| TypeError::InvalidHash(input.to_string()))
}

/// True for strings shaped like a transaction hash (`0x` + 64 hex chars).
pub fn is_hash_shaped(input: &str) -> bool {
	input.starts_with("0x")
		&& input.len() == 66
		&& input[2..].chars().all(|c| c.is_ascii_hexdigit())
}
