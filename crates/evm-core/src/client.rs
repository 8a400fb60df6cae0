//! Caller-facing client.

use crate::lifecycle::{TransactionManager, TxOptions};
use crate::monitoring::{ConfirmationTracker, PendingTransaction};
use crate::pricing::GasPricer;
use crate::ClientError;
use alloy_primitives::{Address, Bytes, B256, U256};
use evm_names::NameResolver;
use evm_rpc::RpcClient;
use evm_types::{Block, BlockDirective, BlockRef, Log, LogFilter, Transaction, TransactionReceipt};
use std::sync::Arc;

/// Entry point for querying a chain and sending transactions.
///
/// Every method accepting an address also accepts a name.
pub struct EvmClient {
	rpc: Arc<RpcClient>,
	names: Arc<NameResolver>,
	pricer: Arc<GasPricer>,
	tracker: Arc<ConfirmationTracker>,
	transactions: TransactionManager,
}

impl EvmClient {
	pub fn new(
		rpc: Arc<RpcClient>,
		names: Arc<NameResolver>,
		pricer: Arc<GasPricer>,
		tracker: Arc<ConfirmationTracker>,
		transactions: TransactionManager,
	) -> Self {
		Self {
			rpc,
			names,
			pricer,
			tracker,
			transactions,
		}
	}

	/// The underlying RPC client, for calls not covered here.
	pub fn rpc(&self) -> &Arc<RpcClient> {
		&self.rpc
	}

	pub async fn chain_id(&self) -> Result<u64, ClientError> {
		Ok(self.rpc.chain_id().await?)
	}

	/// Resolves a name or address literal at the latest block.
	pub async fn resolve(&self, name: &str) -> Result<Address, ClientError> {
		Ok(self.names.resolve(name, None).await?)
	}

	/// Balance at `block`. A head-relative block is fixed once, so the name
	/// and the balance are read at the same height.
	pub async fn get_balance(
		&self,
		address_or_name: &str,
		block: Option<BlockDirective>,
	) -> Result<U256, ClientError> {
		let block = self.rpc.pin_block(block.unwrap_or_default()).await?;
		let address = self.names.resolve(address_or_name, Some(block)).await?;
		Ok(self.rpc.balance(address, block).await?)
	}

	pub async fn get_code(
		&self,
		address_or_name: &str,
		block: Option<BlockDirective>,
	) -> Result<Bytes, ClientError> {
		let block = self.rpc.pin_block(block.unwrap_or_default()).await?;
		let address = self.names.resolve(address_or_name, Some(block)).await?;
		Ok(self.rpc.code(address, block).await?)
	}

	/// Transaction count of the account, which is its next nonce.
	pub async fn get_nonce(
		&self,
		address_or_name: &str,
		block: Option<BlockDirective>,
	) -> Result<u64, ClientError> {
		let block = self.rpc.pin_block(block.unwrap_or_default()).await?;
		let address = self.names.resolve(address_or_name, Some(block)).await?;
		Ok(self.rpc.transaction_count(address, block).await?)
	}

	pub async fn get_block(&self, block: BlockRef, full: bool) -> Result<Option<Block>, ClientError> {
		Ok(self.rpc.block(block, full).await?)
	}

	pub async fn get_block_number(&self) -> Result<u64, ClientError> {
		Ok(self.rpc.block_number().await?)
	}

	/// Node gas price with the configured price bonus applied.
	pub async fn get_gas_price(&self) -> Result<U256, ClientError> {
		Ok(self.pricer.legacy_gas_price().await?)
	}

	pub async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError> {
		Ok(self.rpc.transaction(hash).await?)
	}

	pub async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, ClientError> {
		Ok(self.rpc.transaction_receipt(hash).await?)
	}

	pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ClientError> {
		Ok(self.rpc.logs(filter).await?)
	}

	pub async fn estimate_gas(
		&self,
		to: Option<&str>,
		options: &TxOptions,
	) -> Result<u64, ClientError> {
		Ok(self.transactions.estimate_gas(to, options).await?)
	}

	pub async fn call(&self, to: Option<&str>, options: &TxOptions) -> Result<Bytes, ClientError> {
		Ok(self.transactions.call(to, options).await?)
	}

	pub async fn send(
		&self,
		to: Option<&str>,
		options: &TxOptions,
	) -> Result<PendingTransaction, ClientError> {
		Ok(self.transactions.send(to, options).await?)
	}

	pub async fn transfer(
		&self,
		to: &str,
		amount: U256,
		options: &TxOptions,
	) -> Result<PendingTransaction, ClientError> {
		Ok(self.transactions.transfer(to, amount, options).await?)
	}

	/// Tracks a transaction submitted elsewhere.
	pub fn track(&self, hash: B256) -> PendingTransaction {
		self.tracker.track(hash)
	}
}
