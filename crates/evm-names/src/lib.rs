//! Human-readable name resolution.
//!
//! Names are hashed with the hierarchical name-hash scheme and resolved in
//! three read-only calls against the chain's name registry: the resolver
//! for the top-level name, the address from that resolver, and the
//! registry's TTL for caching. Literal addresses pass straight through.

use evm_rpc::RpcError;
use thiserror::Error;

pub mod cache;
pub mod namehash;
pub mod resolver;

pub use cache::{clamp_ttl, NameCache};
pub use namehash::{hashes, namehash, normalize, top_level_hash, NameHashes};
pub use resolver::NameResolver;

/// Errors that can occur while resolving a name.
///
/// None of these write to the cache.
#[derive(Debug, Error)]
pub enum NameError {
	#[error("Invalid name '{name}': {reason}")]
	InvalidName { name: String, reason: String },
	/// No name registry is known for the chain.
	#[error("Name resolution is not supported on chain {0}")]
	UnsupportedChain(u64),
	#[error("No resolver set for '{0}'")]
	NoResolver(String),
	#[error("Resolver returned no address for '{0}'")]
	ResolutionFailed(String),
	#[error("Malformed {call} reply: {message}")]
	InvalidReply { call: &'static str, message: String },
	#[error(transparent)]
	Rpc(#[from] RpcError),
}
