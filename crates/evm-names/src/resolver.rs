//! On-chain name resolution with caching.

use crate::cache::{clamp_ttl, NameCache};
use crate::namehash::hashes;
use crate::NameError;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall, SolValue};
use evm_config::Config;
use evm_rpc::RpcClient;
use evm_types::{is_address, parse_address, BlockDirective, TransactionRequest};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

sol! {
	/// Registry of top-level names.
	interface INameRegistry {
		function resolver(bytes32 node) external view returns (address);
		function ttl(bytes32 node) external view returns (uint64);
	}

	/// Per-name resolver contract.
	interface INameResolver {
		function addr(bytes32 node) external view returns (address);
	}
}

/// Resolves names to addresses against the chain's name registry.
pub struct NameResolver {
	rpc: Arc<RpcClient>,
	registries: HashMap<u64, Address>,
	cache: NameCache,
	min_ttl: Duration,
	max_ttl: Option<Duration>,
}

impl NameResolver {
	pub fn new(
		rpc: Arc<RpcClient>,
		registries: HashMap<u64, Address>,
		min_ttl: Duration,
		max_ttl: Option<Duration>,
	) -> Self {
		Self {
			rpc,
			registries,
			cache: NameCache::new(),
			min_ttl,
			max_ttl,
		}
	}

	/// Resolver using the built-in registry table merged with configured
	/// chains, and the configured TTL bounds.
	pub fn from_config(rpc: Arc<RpcClient>, config: &Config) -> Self {
		Self::new(
			rpc,
			config.name_registries(),
			config.names.min_ttl(),
			config.names.max_ttl(),
		)
	}

	pub fn cache(&self) -> &NameCache {
		&self.cache
	}

	/// Resolves an address literal or a dotted name.
	///
	/// Literal addresses are returned without touching the chain. Names are
	/// looked up at `block` (default `latest`).
	pub async fn resolve(
		&self,
		input: &str,
		block: Option<BlockDirective>,
	) -> Result<Address, NameError> {
		if is_address(input) {
			return parse_address(input).map_err(|e| NameError::InvalidName {
				name: input.to_string(),
				reason: e.to_string(),
			});
		}

		let hashes = hashes(input)?;
		let chain_id = self.rpc.chain_id().await?;
		if let Some(address) = self.cache.get(chain_id, hashes.full).await {
			tracing::trace!(name = %input, %address, "Name cache hit");
			return Ok(address);
		}

		let registry = *self
			.registries
			.get(&chain_id)
			.ok_or(NameError::UnsupportedChain(chain_id))?;

		// All three reads must see the same block.
		let block = self.rpc.pin_block(block.unwrap_or_default()).await?;

		let resolver = self
			.read_address(
				registry,
				INameRegistry::resolverCall {
					node: hashes.top_level,
				},
				block,
			)
			.await?
			.ok_or_else(|| NameError::NoResolver(input.to_string()))?;

		let address = self
			.read_address(resolver, INameResolver::addrCall { node: hashes.full }, block)
			.await?
			.ok_or_else(|| NameError::ResolutionFailed(input.to_string()))?;

		let raw = self
			.eth_call(
				registry,
				INameRegistry::ttlCall {
					node: hashes.top_level,
				},
				block,
			)
			.await?;
		let ttl_seconds = u64::abi_decode(&raw, true).map_err(|e| NameError::InvalidReply {
			call: "ttl",
			message: e.to_string(),
		})?;

		let ttl = clamp_ttl(ttl_seconds, self.min_ttl, self.max_ttl);
		self.cache.insert(chain_id, hashes.full, address, ttl).await;

		tracing::debug!(
			name = %input,
			%address,
			chain_id,
			ttl_ms = ttl.as_millis() as u64,
			"Resolved name"
		);
		Ok(address)
	}

	/// Resolves several inputs concurrently, failing on the first error.
	pub async fn resolve_many(
		&self,
		inputs: &[&str],
		block: Option<BlockDirective>,
	) -> Result<Vec<Address>, NameError> {
		try_join_all(inputs.iter().map(|input| self.resolve(input, block))).await
	}

	async fn eth_call<C: SolCall>(
		&self,
		to: Address,
		call: C,
		block: BlockDirective,
	) -> Result<Bytes, NameError> {
		let request = TransactionRequest {
			to: Some(to),
			data: Some(Bytes::from(call.abi_encode())),
			..Default::default()
		};
		Ok(self.rpc.call(&request, block, None).await?)
	}

	/// Reads an address-returning view; `None` for the zero address or a
	/// reply that is not a valid address word.
	async fn read_address<C: SolCall>(
		&self,
		to: Address,
		call: C,
		block: BlockDirective,
	) -> Result<Option<Address>, NameError> {
		let raw = self.eth_call(to, call, block).await?;
		Ok(Address::abi_decode(&raw, true)
			.ok()
			.filter(|address| !address.is_zero()))
	}
}
