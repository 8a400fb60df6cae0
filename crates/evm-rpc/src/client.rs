//! Typed JSON-RPC client.
//!
//! Owns request-id allocation and response correlation, turns error objects
//! into structured errors (including revert payloads), and decodes results
//! into the record types of `evm-types`. The only state kept is the id
//! counter and the memoised chain id.

use crate::transport::{JsonRpcError, JsonRpcRequest, TransportError, TransportInterface};
use alloy_primitives::{Address, Bytes, B256, U256};
use evm_types::{
	address::is_hash_shaped,
	quantity::{encode_u64, parse_quantity, parse_u64},
	parse_address, truncate_middle, Block, BlockDirective, BlockRef, BlockTag, Log, LogFilter,
	StateOverride, Transaction, TransactionReceipt, TransactionRequest, TypeError,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Longest parameter summary embedded in a remote error message.
const PARAMS_SUMMARY_LEN: usize = 120;

const INVALID_PARAMS: i64 = -32602;

/// Errors returned by the RPC client.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The response answered a different request.
	#[error("Response id {received} does not match request id {expected}")]
	CorrelationMismatch { expected: u64, received: String },
	/// The node returned an error object.
	#[error("{method}({params}) failed: {message}")]
	Remote {
		method: String,
		params: String,
		code: i64,
		message: String,
		data: Option<Value>,
		/// Revert payload recovered from `data`, if any.
		revert_data: Option<Bytes>,
	},
	#[error("Failed to decode {method} result: {message}")]
	Decode { method: String, message: String },
	#[error(transparent)]
	Validation(#[from] TypeError),
}

impl RpcError {
	/// Revert payload attached to a remote error.
	pub fn revert_data(&self) -> Option<&Bytes> {
		match self {
			RpcError::Remote { revert_data, .. } => revert_data.as_ref(),
			_ => None,
		}
	}

	/// True when the node rejected the shape of the parameters.
	pub fn is_invalid_params(&self) -> bool {
		match self {
			RpcError::Remote { code, message, .. } => {
				*code == INVALID_PARAMS || message.to_ascii_lowercase().contains("too many arguments")
			},
			_ => false,
		}
	}

	fn decode(method: &str, message: impl ToString) -> Self {
		RpcError::Decode {
			method: method.to_string(),
			message: message.to_string(),
		}
	}
}

/// Finds a revert payload in an error's `data` member.
///
/// Simulating nodes report reverts as an object keyed by transaction hash,
/// each entry carrying the revert bytes under `return`; the first such entry
/// wins. A bare hex string is also taken as the payload.
pub fn extract_revert_data(data: &Value) -> Option<Bytes> {
	match data {
		Value::Object(entries) => entries
			.iter()
			.filter(|(key, _)| is_hash_shaped(key))
			.find_map(|(_, entry)| entry.get("return")?.as_str()?.parse::<Bytes>().ok()),
		Value::String(raw) if raw.starts_with("0x") => raw.parse::<Bytes>().ok(),
		_ => None,
	}
}

fn remote_error(method: &str, params: &Value, error: JsonRpcError) -> RpcError {
	let revert_data = error.data.as_ref().and_then(extract_revert_data);
	RpcError::Remote {
		method: method.to_string(),
		params: truncate_middle(&params.to_string(), PARAMS_SUMMARY_LEN),
		code: error.code,
		message: error.message,
		data: error.data,
		revert_data,
	}
}

fn id_matches(received: &Value, expected: u64) -> bool {
	match received {
		Value::Number(n) => n.as_u64() == Some(expected),
		Value::String(s) => s.parse::<u64>().ok() == Some(expected),
		_ => false,
	}
}

/// JSON-RPC client over a shared transport.
pub struct RpcClient {
	transport: Arc<dyn TransportInterface>,
	next_id: AtomicU64,
	chain_id: OnceCell<u64>,
}

impl RpcClient {
	pub fn new(transport: Arc<dyn TransportInterface>) -> Self {
		Self {
			transport,
			next_id: AtomicU64::new(1),
			chain_id: OnceCell::new(),
		}
	}

	pub fn transport(&self) -> &Arc<dyn TransportInterface> {
		&self.transport
	}

	/// Issues `method` with positional `params` and returns the raw result.
	///
	/// A `null` or absent result is returned as `Value::Null`.
	pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		tracing::trace!(method, id, "Sending request");

		let response = self
			.transport
			.send(JsonRpcRequest::new(id, method, params.clone()))
			.await?;

		if !id_matches(&response.id, id) {
			tracing::warn!(method, id, received = %response.id, "Response id mismatch");
			return Err(RpcError::CorrelationMismatch {
				expected: id,
				received: response.id.to_string(),
			});
		}

		if let Some(error) = response.error {
			tracing::debug!(method, id, code = error.code, message = %error.message, "Remote error");
			return Err(remote_error(method, &params, error));
		}

		Ok(response.result.unwrap_or(Value::Null))
	}

	/// Issues `method` and deserializes the result into `T`.
	pub async fn request_typed<T: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
	) -> Result<T, RpcError> {
		let value = self.request(method, params).await?;
		serde_json::from_value(value).map_err(|e| RpcError::decode(method, e))
	}

	async fn request_quantity(&self, method: &str, params: Value) -> Result<U256, RpcError> {
		let value = self.request(method, params).await?;
		parse_quantity(method, &value).map_err(|e| RpcError::decode(method, e))
	}

	async fn request_u64(&self, method: &str, params: Value) -> Result<u64, RpcError> {
		let value = self.request(method, params).await?;
		parse_u64(method, &value).map_err(|e| RpcError::decode(method, e))
	}

	async fn request_hash(&self, method: &str, params: Value) -> Result<B256, RpcError> {
		let value = self.request(method, params).await?;
		value
			.as_str()
			.ok_or_else(|| RpcError::decode(method, format!("expected a hash, got {}", value)))
			.and_then(|raw| evm_types::parse_hash(raw).map_err(|e| RpcError::decode(method, e)))
	}

	/// Chain id of the connected node, fetched once per client.
	pub async fn chain_id(&self) -> Result<u64, RpcError> {
		self.chain_id
			.get_or_try_init(|| self.request_u64("eth_chainId", json!([])))
			.await
			.copied()
	}

	/// Accounts held by the node.
	pub async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
		let raw: Vec<String> = self.request_typed("eth_accounts", json!([])).await?;
		raw.iter()
			.map(|account| parse_address(account).map_err(|e| RpcError::decode("eth_accounts", e)))
			.collect()
	}

	/// First account held by the node, if any.
	pub async fn default_account(&self) -> Result<Option<Address>, RpcError> {
		Ok(self.accounts().await?.into_iter().next())
	}

	pub async fn block_number(&self) -> Result<u64, RpcError> {
		self.request_u64("eth_blockNumber", json!([])).await
	}

	/// Resolves a directive to an absolute block number.
	///
	/// Absolute numbers and `earliest` need no round trip; everything else is
	/// computed against the current head.
	pub async fn resolve_block_number(&self, directive: BlockDirective) -> Result<u64, RpcError> {
		match directive {
			BlockDirective::Number(n) => Ok(n),
			BlockDirective::Tag(BlockTag::Earliest) => Ok(0),
			other => {
				let head = self.block_number().await?;
				Ok(other.offset_from_head(head)?)
			},
		}
	}

	/// RPC block parameter for `directive`, resolving head offsets first.
	pub async fn block_param(&self, directive: BlockDirective) -> Result<String, RpcError> {
		match directive.as_rpc_param() {
			Some(param) => Ok(param),
			None => Ok(encode_u64(self.resolve_block_number(directive).await?)),
		}
	}

	/// Turns a head-relative directive into an absolute number so that
	/// several requests observe the same block. Other directives are
	/// returned unchanged.
	pub async fn pin_block(&self, directive: BlockDirective) -> Result<BlockDirective, RpcError> {
		match directive {
			BlockDirective::Behind(_) => Ok(BlockDirective::Number(
				self.resolve_block_number(directive).await?,
			)),
			other => Ok(other),
		}
	}

	/// Transaction count (next nonce) of `address` at `block`.
	pub async fn transaction_count(
		&self,
		address: Address,
		block: BlockDirective,
	) -> Result<u64, RpcError> {
		let block = self.block_param(block).await?;
		self.request_u64("eth_getTransactionCount", json!([address, block]))
			.await
	}

	pub async fn balance(&self, address: Address, block: BlockDirective) -> Result<U256, RpcError> {
		let block = self.block_param(block).await?;
		self.request_quantity("eth_getBalance", json!([address, block]))
			.await
	}

	pub async fn code(&self, address: Address, block: BlockDirective) -> Result<Bytes, RpcError> {
		let block = self.block_param(block).await?;
		self.request_typed("eth_getCode", json!([address, block]))
			.await
	}

	pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError> {
		self.request_typed("eth_getLogs", json!([filter])).await
	}

	pub async fn gas_price(&self) -> Result<U256, RpcError> {
		self.request_quantity("eth_gasPrice", json!([])).await
	}

	pub async fn max_priority_fee_per_gas(&self) -> Result<U256, RpcError> {
		self.request_quantity("eth_maxPriorityFeePerGas", json!([]))
			.await
	}

	/// Fetches a block by hash or directive. `None` when the node has no
	/// such block.
	pub async fn block(&self, block: BlockRef, full: bool) -> Result<Option<Block>, RpcError> {
		match block {
			BlockRef::Hash(hash) => {
				self.request_typed("eth_getBlockByHash", json!([hash, full]))
					.await
			},
			BlockRef::Directive(directive) => {
				let param = self.block_param(directive).await?;
				self.request_typed("eth_getBlockByNumber", json!([param, full]))
					.await
			},
		}
	}

	/// Gas estimate for `tx`, optionally pinned to `block`.
	///
	/// Some providers reject the trailing block argument; when they do, the
	/// estimate is retried once without it.
	pub async fn estimate_gas(
		&self,
		tx: &TransactionRequest,
		block: Option<BlockDirective>,
	) -> Result<u64, RpcError> {
		let Some(block) = block else {
			return self.request_u64("eth_estimateGas", json!([tx])).await;
		};

		let param = self.block_param(block).await?;
		match self
			.request_u64("eth_estimateGas", json!([tx, param]))
			.await
		{
			Err(e) if e.is_invalid_params() => {
				tracing::debug!("eth_estimateGas rejected block argument, retrying without it");
				self.request_u64("eth_estimateGas", json!([tx])).await
			},
			other => other,
		}
	}

	/// Executes `tx` without creating a transaction and returns its output.
	pub async fn call(
		&self,
		tx: &TransactionRequest,
		block: BlockDirective,
		state_override: Option<&StateOverride>,
	) -> Result<Bytes, RpcError> {
		let block = self.block_param(block).await?;
		let params = match state_override {
			Some(overrides) => json!([tx, block, overrides]),
			None => json!([tx, block]),
		};
		self.request_typed("eth_call", params).await
	}

	pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RpcError> {
		self.request_hash("eth_sendRawTransaction", json!([raw]))
			.await
	}

	/// Submits an unsigned request for the node to sign with one of its
	/// accounts.
	pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, RpcError> {
		self.request_hash("eth_sendTransaction", json!([tx])).await
	}

	/// Receipt of `hash`; `None` while the transaction is not mined.
	pub async fn transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, RpcError> {
		self.request_typed("eth_getTransactionReceipt", json!([hash]))
			.await
	}

	pub async fn transaction(&self, hash: B256) -> Result<Option<Transaction>, RpcError> {
		self.request_typed("eth_getTransactionByHash", json!([hash]))
			.await
	}
}
