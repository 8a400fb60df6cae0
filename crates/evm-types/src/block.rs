//! Block directives.
//!
//! A directive names a block the way callers think of it: a symbolic tag,
//! an absolute number, or an offset behind the chain head. Only the last
//! form needs a round trip to the node before it can be sent as an RPC
//! parameter; the client layer owns that resolution.

use crate::{parse_hash, quantity::encode_u64, TypeError};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbolic block tags understood by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
	Latest,
	Pending,
	Earliest,
}

impl BlockTag {
	pub fn as_str(&self) -> &'static str {
		match self {
			BlockTag::Latest => "latest",
			BlockTag::Pending => "pending",
			BlockTag::Earliest => "earliest",
		}
	}
}

/// Reference to a block by tag, absolute number, or distance from the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockDirective {
	Tag(BlockTag),
	Number(u64),
	/// `Behind(n)` is the caller's `-n`: `Behind(1)` is the latest mined block.
	Behind(u64),
}

impl Default for BlockDirective {
	fn default() -> Self {
		BlockDirective::Tag(BlockTag::Latest)
	}
}

impl BlockDirective {
	pub const LATEST: BlockDirective = BlockDirective::Tag(BlockTag::Latest);
	pub const PENDING: BlockDirective = BlockDirective::Tag(BlockTag::Pending);

	/// Builds a directive from a signed integer; negatives count back from the head.
	pub fn from_i64(value: i64) -> Result<Self, TypeError> {
		if value >= 0 {
			Ok(BlockDirective::Number(value as u64))
		} else {
			Ok(BlockDirective::Behind(value.unsigned_abs()))
		}
	}

	/// Returns the RPC parameter for directives that need no resolution.
	///
	/// `Behind` directives return `None`; they must first be turned into an
	/// absolute number against the current head.
	pub fn as_rpc_param(&self) -> Option<String> {
		match self {
			BlockDirective::Tag(tag) => Some(tag.as_str().to_string()),
			BlockDirective::Number(n) => Some(encode_u64(*n)),
			BlockDirective::Behind(_) => None,
		}
	}

	/// Applies a `Behind` offset to the current head number.
	///
	/// `-1` is the head itself, `-n` is `head - n + 1`. A result that is not
	/// strictly positive is rejected.
	pub fn offset_from_head(&self, head: u64) -> Result<u64, TypeError> {
		match self {
			BlockDirective::Behind(n) => {
				let resolved = head as i128 - *n as i128 + 1;
				if resolved <= 0 {
					Err(TypeError::InvalidBlock(format!(
						"-{} resolves to {} at head {}",
						n, resolved, head
					)))
				} else {
					Ok(resolved as u64)
				}
			},
			BlockDirective::Number(n) => Ok(*n),
			BlockDirective::Tag(BlockTag::Earliest) => Ok(0),
			BlockDirective::Tag(_) => Ok(head),
		}
	}
}

impl fmt::Display for BlockDirective {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BlockDirective::Tag(tag) => write!(f, "{}", tag.as_str()),
			BlockDirective::Number(n) => write!(f, "{}", n),
			BlockDirective::Behind(n) => write!(f, "-{}", n),
		}
	}
}

impl FromStr for BlockDirective {
	type Err = TypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		match trimmed.to_ascii_lowercase().as_str() {
			"latest" => return Ok(BlockDirective::Tag(BlockTag::Latest)),
			"pending" => return Ok(BlockDirective::Tag(BlockTag::Pending)),
			"earliest" => return Ok(BlockDirective::Tag(BlockTag::Earliest)),
			_ => {},
		}

		let invalid = || TypeError::InvalidBlock(s.to_string());
		if let Some(hex) = trimmed
			.strip_prefix("0x")
			.or_else(|| trimmed.strip_prefix("0X"))
		{
			return u64::from_str_radix(hex, 16)
				.map(BlockDirective::Number)
				.map_err(|_| invalid());
		}
		trimmed
			.parse::<i64>()
			.map_err(|_| invalid())
			.and_then(BlockDirective::from_i64)
	}
}

/// A block named either by hash or by directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
	Hash(B256),
	Directive(BlockDirective),
}

impl From<BlockDirective> for BlockRef {
	fn from(directive: BlockDirective) -> Self {
		BlockRef::Directive(directive)
	}
}

impl From<B256> for BlockRef {
	fn from(hash: B256) -> Self {
		BlockRef::Hash(hash)
	}
}

impl FromStr for BlockRef {
	type Err = TypeError;

	/// 66-character hex strings are hashes, anything else a directive.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.len() == 66 && (trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
			return parse_hash(trimmed).map(BlockRef::Hash);
		}
		trimmed.parse().map(BlockRef::Directive)
	}
}
