//! Transaction requests and `eth_call` state overrides.

use crate::quantity::{opt_u256, opt_u64};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A transaction as sent to `eth_call`, `eth_estimateGas` and
/// `eth_sendTransaction`.
///
/// Unset fields are omitted from the JSON so the node fills them in. A
/// request needs either a destination or non-empty calldata (contract
/// creation) before it can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub to: Option<Address>,
	#[serde(default, with = "crate::quantity::u256")]
	pub value: U256,
	#[serde(
		default,
		rename = "data",
		alias = "input",
		skip_serializing_if = "Option::is_none"
	)]
	pub data: Option<Bytes>,
	#[serde(default, with = "opt_u64", skip_serializing_if = "Option::is_none")]
	pub gas: Option<u64>,
	#[serde(default, with = "opt_u256", skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	#[serde(default, with = "opt_u256", skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<U256>,
	#[serde(default, with = "opt_u256", skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(default, with = "opt_u64", skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
	#[serde(default, with = "opt_u64", skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<u64>,
}

impl TransactionRequest {
	/// True when the request has a recipient or deploys code.
	pub fn has_destination(&self) -> bool {
		self.to.is_some() || self.data.as_ref().is_some_and(|data| !data.is_empty())
	}

	/// Calldata, empty when unset.
	pub fn input(&self) -> Bytes {
		self.data.clone().unwrap_or_default()
	}

	/// Removes every fee field.
	pub fn clear_fees(&mut self) {
		self.gas_price = None;
		self.max_fee_per_gas = None;
		self.max_priority_fee_per_gas = None;
	}

	/// True when either fee-market field is set.
	pub fn has_fee_market_fields(&self) -> bool {
		self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
	}
}

/// Per-account overrides applied to an `eth_call` execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverride {
	#[serde(default, with = "opt_u256", skip_serializing_if = "Option::is_none")]
	pub balance: Option<U256>,
	#[serde(default, with = "opt_u64", skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<Bytes>,
	/// Storage slots patched on top of the account's existing storage.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_diff: Option<HashMap<B256, B256>>,
}

/// Address to override map, the third `eth_call` parameter.
pub type StateOverride = HashMap<Address, AccountOverride>;
