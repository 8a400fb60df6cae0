//! Common types for the EVM client runtime.
//!
//! This crate defines the value types shared by every layer of the client:
//! validated addresses and hashes, block directives, transaction requests,
//! the records returned by a node, the quantity codec used to decode them,
//! and the static chain table (name registries and hardfork rules).

/// Address parsing and checksum normalisation.
pub mod address;
/// Block directives and block references.
pub mod block;
/// Static per-chain data: name registries and hardfork schedules.
pub mod chains;
/// Local validation errors.
pub mod error;
/// Hex/decimal quantity codec used for RPC values.
pub mod quantity;
/// Blocks, receipts, logs and transactions as returned by a node.
pub mod records;
/// Redacting wrapper for private keys.
pub mod secret_string;
/// Transaction requests and state overrides.
pub mod transaction;
/// Formatting helpers.
pub mod utils;

pub use address::{is_address, parse_address, parse_hash};
pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use block::{BlockDirective, BlockRef, BlockTag};
pub use chains::{
	default_hardforks, default_name_registries, HardforkRule, HardforkSchedule, RuleSet,
	TxEncoding,
};
pub use error::TypeError;
pub use records::{Block, BlockTransactions, Log, LogFilter, Transaction, TransactionReceipt};
pub use secret_string::SecretString;
pub use transaction::{AccountOverride, StateOverride, TransactionRequest};
pub use utils::{format_units, truncate_middle, without_0x_prefix};
