//! TTL-bounded cache of resolved names.

use alloy_primitives::{Address, B256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
	address: Address,
	expires_at: Instant,
}

/// Resolved addresses keyed by `(chain id, full name hash)`.
///
/// Reads and writes are independent: two concurrent misses on the same
/// name both resolve on-chain and the later write wins.
#[derive(Debug, Default)]
pub struct NameCache {
	entries: RwLock<HashMap<(u64, B256), CacheEntry>>,
}

impl NameCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cached address for the key, if present and unexpired.
	pub async fn get(&self, chain_id: u64, node: B256) -> Option<Address> {
		let entries = self.entries.read().await;
		entries
			.get(&(chain_id, node))
			.filter(|entry| entry.expires_at > Instant::now())
			.map(|entry| entry.address)
	}

	/// Stores `address` for `ttl` from now. A zero `ttl` stores nothing.
	pub async fn insert(&self, chain_id: u64, node: B256, address: Address, ttl: Duration) {
		if ttl.is_zero() {
			return;
		}
		let mut entries = self.entries.write().await;
		entries.insert(
			(chain_id, node),
			CacheEntry {
				address,
				expires_at: Instant::now() + ttl,
			},
		);
	}

	/// Expiry of the entry for the key, expired or not.
	pub async fn expires_at(&self, chain_id: u64, node: B256) -> Option<Instant> {
		let entries = self.entries.read().await;
		entries.get(&(chain_id, node)).map(|entry| entry.expires_at)
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}

	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}
}

/// Converts a registry TTL in seconds to a cache lifetime within
/// `[min, max]`.
pub fn clamp_ttl(ttl_seconds: u64, min: Duration, max: Option<Duration>) -> Duration {
	let ttl = Duration::from_millis(ttl_seconds.saturating_mul(1000));
	let ttl = ttl.max(min);
	match max {
		Some(max) => ttl.min(max),
		None => ttl,
	}
}
