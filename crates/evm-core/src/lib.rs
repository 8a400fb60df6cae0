//! Client runtime for Ethereum-compatible nodes.
//!
//! Ties the RPC client, name resolver, gas pricer, signer and confirmation
//! tracker together behind [`EvmClient`]. [`ClientBuilder`] wires the
//! components from a [`Config`](evm_config::Config).

use alloy_primitives::B256;
use evm_account::AccountError;
use evm_config::ConfigError;
use evm_names::NameError;
use evm_rpc::{RpcError, TransportError};
use evm_types::TransactionReceipt;
use thiserror::Error;

pub mod builder;
pub mod client;
pub mod lifecycle;
pub mod monitoring;
pub mod pricing;

pub use builder::ClientBuilder;
pub use client::EvmClient;
pub use lifecycle::{Sender, TransactionManager, TxOptions};
pub use monitoring::{ConfirmationState, ConfirmationTracker, PendingTransaction};
pub use pricing::{apply_bonus, estimate_with_bonus, FeeFields, GasPricer, PricingError};

/// Errors from building, submitting or tracking a transaction.
#[derive(Debug, Error)]
pub enum TxError {
	/// Neither a recipient nor calldata was given.
	#[error("Transaction has no destination and no calldata")]
	NoDestination,
	#[error("Cannot determine the sending account")]
	CannotDetermineCaller,
	/// A gas price was given together with fee-market fields.
	#[error("Transaction sets both a gas price and fee-market fields")]
	ConflictingFees,
	#[error(transparent)]
	Rpc(#[from] RpcError),
	#[error(transparent)]
	Names(#[from] NameError),
	#[error(transparent)]
	Pricing(#[from] PricingError),
	#[error("Signing failed: {0}")]
	Signing(#[from] AccountError),
	/// The receipt reports failed execution.
	#[error("Transaction {hash} reverted in block {}", .receipt.block_number)]
	TransactionFailed {
		hash: B256,
		receipt: Box<TransactionReceipt>,
	},
	#[error("Transaction {hash} did not reach {confirmations} confirmations in time")]
	Timeout { hash: B256, confirmations: u64 },
	#[error("Requested {requested} confirmations but tracking stops at {cap}")]
	ConfirmationCap { requested: u64, cap: u64 },
	#[error("Confirmation tracking ended: {0}")]
	Tracking(String),
}

/// Errors surfaced by [`EvmClient`] and [`ClientBuilder`].
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error(transparent)]
	Rpc(#[from] RpcError),
	#[error(transparent)]
	Names(#[from] NameError),
	#[error(transparent)]
	Pricing(#[from] PricingError),
	#[error(transparent)]
	Transaction(#[from] TxError),
}
