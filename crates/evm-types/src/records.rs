//! Records returned by a node.
//!
//! Blocks, receipts, logs and transactions are decoded straight from the
//! RPC JSON. Numeric fields all pass through the quantity codec, so hex,
//! decimal string and JSON number encodings decode the same way.

use crate::quantity::{opt_u256, opt_u64, u256, u64_quantity};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
	pub address: Address,
	#[serde(default)]
	pub topics: Vec<B256>,
	#[serde(default)]
	pub data: Bytes,
	#[serde(default, with = "opt_u64")]
	pub block_number: Option<u64>,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default)]
	pub transaction_hash: Option<B256>,
	#[serde(default, with = "opt_u64")]
	pub log_index: Option<u64>,
	#[serde(default)]
	pub removed: bool,
}

/// Receipt of a mined transaction.
///
/// Re-fetching a receipt for the same hash after a reorg may legally return
/// a different block number or status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
	pub transaction_hash: B256,
	#[serde(with = "u64_quantity")]
	pub block_number: u64,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default, with = "opt_u64")]
	pub transaction_index: Option<u64>,
	#[serde(default)]
	pub from: Option<Address>,
	#[serde(default)]
	pub to: Option<Address>,
	#[serde(with = "u64_quantity")]
	pub gas_used: u64,
	#[serde(default, with = "opt_u64")]
	pub cumulative_gas_used: Option<u64>,
	#[serde(default, with = "opt_u256")]
	pub effective_gas_price: Option<U256>,
	#[serde(default)]
	pub contract_address: Option<Address>,
	#[serde(default)]
	pub logs: Vec<Log>,
	/// `1` success, `0` failure; absent on pre-Byzantium receipts.
	#[serde(default, with = "opt_u64")]
	pub status: Option<u64>,
}

impl TransactionReceipt {
	/// Whether execution succeeded. Receipts without a status field predate
	/// status codes and are treated as successful.
	pub fn success(&self) -> bool {
		self.status.map_or(true, |status| status == 1)
	}
}

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	pub hash: B256,
	#[serde(with = "u64_quantity")]
	pub nonce: u64,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default, with = "opt_u64")]
	pub block_number: Option<u64>,
	#[serde(default, with = "opt_u64")]
	pub transaction_index: Option<u64>,
	pub from: Address,
	#[serde(default)]
	pub to: Option<Address>,
	#[serde(with = "u256")]
	pub value: U256,
	#[serde(with = "u64_quantity")]
	pub gas: u64,
	#[serde(default, with = "opt_u256")]
	pub gas_price: Option<U256>,
	#[serde(default, with = "opt_u256")]
	pub max_fee_per_gas: Option<U256>,
	#[serde(default, with = "opt_u256")]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub input: Bytes,
	#[serde(default, with = "opt_u64")]
	pub chain_id: Option<u64>,
	#[serde(default, rename = "type", with = "opt_u64")]
	pub tx_type: Option<u64>,
}

/// Transactions of a block: hashes only, or full objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
	Hashes(Vec<B256>),
	Full(Vec<Transaction>),
}

impl Default for BlockTransactions {
	fn default() -> Self {
		BlockTransactions::Hashes(Vec::new())
	}
}

impl BlockTransactions {
	pub fn len(&self) -> usize {
		match self {
			BlockTransactions::Hashes(hashes) => hashes.len(),
			BlockTransactions::Full(txs) => txs.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A block header plus its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	/// Absent for the pending block on some nodes.
	#[serde(default, with = "opt_u64")]
	pub number: Option<u64>,
	#[serde(default)]
	pub hash: Option<B256>,
	pub parent_hash: B256,
	#[serde(with = "u64_quantity")]
	pub timestamp: u64,
	#[serde(with = "u64_quantity")]
	pub gas_limit: u64,
	#[serde(with = "u64_quantity")]
	pub gas_used: u64,
	#[serde(default, with = "opt_u256")]
	pub base_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub miner: Option<Address>,
	#[serde(default)]
	pub transactions: BlockTransactions,
}

/// Filter for `eth_getLogs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from_block: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to_block: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub block_hash: Option<B256>,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub address: Vec<Address>,
	/// Positional topic filters; `None` matches anything in that position.
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub topics: Vec<Option<B256>>,
}
