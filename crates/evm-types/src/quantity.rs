//! Quantity codec for JSON-RPC values.
//!
//! Nodes return numbers as `0x`-prefixed hex strings, but some providers
//! answer with decimal strings or plain JSON numbers. Every numeric field of
//! a record goes through the same decoding here, so balances and fees that
//! exceed native integer range land in a `U256`.

use crate::{utils::without_0x_prefix, TypeError};
use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Decodes a quantity string (hex with `0x`, or decimal).
pub fn parse_quantity_str(field: &str, raw: &str) -> Result<U256, TypeError> {
	let invalid = || TypeError::InvalidQuantity {
		field: field.to_string(),
		value: raw.to_string(),
	};

	let trimmed = raw.trim();
	if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
		let digits = without_0x_prefix(trimmed);
		if digits.is_empty() {
			return Ok(U256::ZERO);
		}
		U256::from_str_radix(digits, 16).map_err(|_| invalid())
	} else if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
		U256::from_str_radix(trimmed, 10).map_err(|_| invalid())
	} else {
		Err(invalid())
	}
}

/// Decodes a quantity from a JSON value.
pub fn parse_quantity(field: &str, value: &Value) -> Result<U256, TypeError> {
	match value {
		Value::String(s) => parse_quantity_str(field, s),
		Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(|| TypeError::InvalidQuantity {
			field: field.to_string(),
			value: n.to_string(),
		}),
		other => Err(TypeError::InvalidQuantity {
			field: field.to_string(),
			value: other.to_string(),
		}),
	}
}

/// Decodes a quantity that must fit in a `u64` (block numbers, nonces, gas).
pub fn parse_u64(field: &str, value: &Value) -> Result<u64, TypeError> {
	let quantity = parse_quantity(field, value)?;
	u64::try_from(quantity).map_err(|_| TypeError::InvalidQuantity {
		field: field.to_string(),
		value: value.to_string(),
	})
}

/// Encodes a quantity as minimal `0x` hex.
pub fn encode_quantity(value: U256) -> String {
	if value.is_zero() {
		return "0x0".to_string();
	}
	format!("0x{:x}", value)
}

/// Encodes a `u64` quantity as minimal `0x` hex.
pub fn encode_u64(value: u64) -> String {
	format!("0x{:x}", value)
}

/// Serde helpers for `U256` quantity fields.
pub mod u256 {
	use super::*;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;
		parse_quantity("quantity", &value).map_err(de::Error::custom)
	}

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&encode_quantity(*value))
	}
}

/// Serde helpers for optional `U256` quantity fields.
pub mod opt_u256 {
	use super::*;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Option::<Value>::deserialize(deserializer)? {
			None | Some(Value::Null) => Ok(None),
			Some(value) => parse_quantity("quantity", &value)
				.map(Some)
				.map_err(de::Error::custom),
		}
	}

	pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => serializer.serialize_str(&encode_quantity(*v)),
			None => serializer.serialize_none(),
		}
	}
}

/// Serde helpers for `u64` quantity fields.
pub mod u64_quantity {
	use super::*;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;
		parse_u64("quantity", &value).map_err(de::Error::custom)
	}

	pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&encode_u64(*value))
	}
}

/// Serde helpers for optional `u64` quantity fields.
pub mod opt_u64 {
	use super::*;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Option::<Value>::deserialize(deserializer)? {
			None | Some(Value::Null) => Ok(None),
			Some(value) => parse_u64("quantity", &value)
				.map(Some)
				.map_err(de::Error::custom),
		}
	}

	pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(v) => serializer.serialize_str(&encode_u64(*v)),
			None => serializer.serialize_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_hex_and_decimal_forms() {
		assert_eq!(parse_quantity("v", &json!("0x10")).unwrap(), U256::from(16u64));
		assert_eq!(parse_quantity("v", &json!("16")).unwrap(), U256::from(16u64));
		assert_eq!(parse_quantity("v", &json!(16)).unwrap(), U256::from(16u64));
		assert_eq!(parse_quantity("v", &json!("0x")).unwrap(), U256::ZERO);
	}

	#[test]
	fn test_values_beyond_u64() {
		// 2^80 wei
		let big = parse_quantity("balance", &json!("0x100000000000000000000")).unwrap();
		assert_eq!(big, U256::from(1u64) << 80usize);
		assert!(parse_u64("balance", &json!("0x100000000000000000000")).is_err());
	}

	#[test]
	fn test_invalid_quantities() {
		assert!(parse_quantity("v", &json!("0xzz")).is_err());
		assert!(parse_quantity("v", &json!("-1")).is_err());
		assert!(parse_quantity("v", &json!(true)).is_err());
		let err = parse_quantity("gasUsed", &json!("")).unwrap_err();
		assert!(err.to_string().contains("gasUsed"));
	}

	#[test]
	fn test_encoding_is_minimal_hex() {
		assert_eq!(encode_quantity(U256::ZERO), "0x0");
		assert_eq!(encode_quantity(U256::from(255u64)), "0xff");
		assert_eq!(encode_u64(21_000), "0x5208");
	}
}
