//! Validation errors raised locally, before any network interaction.

use thiserror::Error;

/// Errors produced while validating caller or node supplied values.
///
/// These are never retried: the input itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
	/// Value is not a 20-byte hex address, or fails its checksum.
	#[error("Invalid address '{0}'")]
	InvalidAddress(String),
	/// Value is not a 32-byte hex hash.
	#[error("Invalid hash '{0}'")]
	InvalidHash(String),
	/// Value is not a valid block directive.
	#[error("Invalid block directive '{0}'")]
	InvalidBlock(String),
	/// Value is not a hex byte string.
	#[error("Invalid byte string '{0}'")]
	InvalidBytes(String),
	/// Value is not a hex or decimal quantity.
	#[error("Invalid quantity for '{field}': {value}")]
	InvalidQuantity { field: String, value: String },
}
