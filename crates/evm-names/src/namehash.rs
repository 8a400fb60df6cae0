//! Hierarchical name hashing.
//!
//! A name is folded right to left: starting from 32 zero bytes, each step
//! hashes the accumulator concatenated with the hash of the next label.
//! The result must match the on-chain registry bit for bit.

use crate::NameError;
use alloy_primitives::{keccak256, B256};

/// The two hashes needed to resolve a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameHashes {
	/// Hash over every label; key of the resolver lookup and the cache.
	pub full: B256,
	/// Hash over the last two labels; key of the registry lookups.
	pub top_level: B256,
}

/// Lower-cases and validates a dotted name.
///
/// Names need at least two labels and no label may be empty.
pub fn normalize(name: &str) -> Result<String, NameError> {
	let normalized = name.trim().to_lowercase();
	let labels: Vec<&str> = normalized.split('.').collect();
	if labels.len() < 2 {
		return Err(NameError::InvalidName {
			name: name.to_string(),
			reason: "expected at least two labels".to_string(),
		});
	}
	if labels.iter().any(|label| label.is_empty()) {
		return Err(NameError::InvalidName {
			name: name.to_string(),
			reason: "empty label".to_string(),
		});
	}
	Ok(normalized)
}

fn fold<'a>(labels: impl DoubleEndedIterator<Item = &'a str>) -> B256 {
	labels.rev().fold(B256::ZERO, |node, label| {
		let mut buffer = [0u8; 64];
		buffer[..32].copy_from_slice(node.as_slice());
		buffer[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
		keccak256(buffer)
	})
}

/// Name hash of `name` as given. Callers normally go through [`hashes`],
/// which normalises first.
pub fn namehash(name: &str) -> B256 {
	if name.is_empty() {
		return B256::ZERO;
	}
	fold(name.split('.'))
}

/// Name hash of the last two labels of `name`.
pub fn top_level_hash(name: &str) -> B256 {
	let labels: Vec<&str> = name.split('.').collect();
	let start = labels.len().saturating_sub(2);
	fold(labels[start..].iter().copied())
}

/// Normalises `name` and computes both hashes.
pub fn hashes(name: &str) -> Result<NameHashes, NameError> {
	let normalized = normalize(name)?;
	Ok(NameHashes {
		full: namehash(&normalized),
		top_level: top_level_hash(&normalized),
	})
}
