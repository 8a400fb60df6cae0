//! Signing collaborator for the EVM client runtime.
//!
//! The client never stores keys. A key is handed in per operation (or taken
//! from configuration by the caller) together with the canonical fields of
//! a transaction, and the signer returns wire-ready bytes. Which wire format
//! is produced is decided by the caller from the active hardfork rule.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use evm_types::{SecretString, TxEncoding};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

pub use implementations::local::LocalSigner;

/// Errors that can occur during key handling and signing.
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The transaction fields do not fit the requested encoding.
	#[error("Invalid transaction: {0}")]
	InvalidTransaction(String),
}

/// Canonical transaction fields handed to a signer.
///
/// `gas_price` is used by the legacy and access-list encodings; the two
/// fee-market fields by the fee-market encoding. `chain_id` is `None` only
/// for legacy transactions signed without replay protection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsignedTransaction {
	pub chain_id: Option<u64>,
	pub nonce: u64,
	pub to: Option<Address>,
	pub value: U256,
	pub input: Bytes,
	pub gas_limit: u64,
	pub gas_price: Option<U256>,
	pub max_fee_per_gas: Option<U256>,
	pub max_priority_fee_per_gas: Option<U256>,
}

/// Key-to-address derivation and transaction signing.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Address controlled by `key`.
	fn derive_address(&self, key: &SecretString) -> Result<Address, AccountError>;

	/// Signs `tx` with `key` and returns the EIP-2718 encoded bytes, ready for
	/// `eth_sendRawTransaction`.
	async fn sign_transaction(
		&self,
		key: &SecretString,
		tx: &UnsignedTransaction,
		encoding: TxEncoding,
	) -> Result<Bytes, AccountError>;
}
