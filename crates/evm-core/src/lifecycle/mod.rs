//! Building, signing and submitting transactions.
//!
//! `send`, `transfer`, `call` and `estimate_gas` share one construction
//! pipeline: check that there is a destination, resolve `to` and `from`
//! through the name resolver, then assemble a request. `send` additionally
//! fills in nonce, gas, fees and chain id and hands the submitted hash to
//! the confirmation tracker.

use crate::monitoring::{ConfirmationTracker, PendingTransaction};
use crate::pricing::GasPricer;
use crate::TxError;
use alloy_primitives::{Address, Bytes, U256};
use evm_account::{SignerInterface, UnsignedTransaction};
use evm_names::NameResolver;
use evm_rpc::RpcClient;
use evm_types::{
	BlockDirective, RuleSet, SecretString, StateOverride, TransactionRequest, TxEncoding,
};
use std::sync::Arc;
use tracing::instrument;

/// Who sends a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
	Address(Address),
	/// An address literal or a name to resolve.
	Name(String),
	/// Index into the node's `eth_accounts`.
	Index(usize),
}

/// Optional fields of a transaction. Anything left unset is filled in by
/// the manager or the node.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
	pub from: Option<Sender>,
	/// Signs locally with this key instead of the configured one.
	pub key: Option<SecretString>,
	pub value: Option<U256>,
	pub data: Option<Bytes>,
	pub gas: Option<u64>,
	pub gas_price: Option<U256>,
	pub max_fee_per_gas: Option<U256>,
	pub max_priority_fee_per_gas: Option<U256>,
	pub nonce: Option<u64>,
	pub chain_id: Option<u64>,
	/// Block for `call` and `estimate_gas`.
	pub block: Option<BlockDirective>,
	/// Account overrides for `call`.
	pub state_override: Option<StateOverride>,
}

impl TxOptions {
	fn has_calldata(&self) -> bool {
		self.data.as_ref().is_some_and(|data| !data.is_empty())
	}
}

/// Orchestrates name resolution, pricing, signing and submission.
pub struct TransactionManager {
	rpc: Arc<RpcClient>,
	names: Arc<NameResolver>,
	pricer: Arc<GasPricer>,
	signer: Arc<dyn SignerInterface>,
	tracker: Arc<ConfirmationTracker>,
	/// Key used when the options carry none.
	default_key: Option<SecretString>,
}

impl TransactionManager {
	pub fn new(
		rpc: Arc<RpcClient>,
		names: Arc<NameResolver>,
		pricer: Arc<GasPricer>,
		signer: Arc<dyn SignerInterface>,
		tracker: Arc<ConfirmationTracker>,
		default_key: Option<SecretString>,
	) -> Self {
		Self {
			rpc,
			names,
			pricer,
			signer,
			tracker,
			default_key,
		}
	}

	fn signing_key<'a>(&'a self, options: &'a TxOptions) -> Option<&'a SecretString> {
		options
			.key
			.as_ref()
			.or(self.default_key.as_ref())
			.filter(|key| !key.is_empty())
	}

	/// Sender address. `None` when nothing identifies one.
	///
	/// With `best_effort`, a node that cannot list its accounts also yields
	/// `None` instead of failing the request.
	async fn resolve_sender(
		&self,
		options: &TxOptions,
		best_effort: bool,
	) -> Result<Option<Address>, TxError> {
		let account = match &options.from {
			Some(Sender::Address(address)) => return Ok(Some(*address)),
			Some(Sender::Name(name)) => return Ok(Some(self.names.resolve(name, None).await?)),
			Some(Sender::Index(index)) => self
				.rpc
				.accounts()
				.await
				.map(|accounts| accounts.get(*index).copied()),
			None => match self.signing_key(options) {
				Some(key) => return Ok(Some(self.signer.derive_address(key)?)),
				None => self.rpc.default_account().await,
			},
		};
		match account {
			Ok(account) => Ok(account),
			Err(e) if best_effort => {
				tracing::debug!(error = %e, "Node accounts unavailable, leaving sender unset");
				Ok(None)
			},
			Err(e) => Err(e.into()),
		}
	}

	/// Shared construction pipeline. `send` needs a sender; `call` and
	/// `estimate_gas` resolve one only on a best-effort basis.
	async fn build_request(
		&self,
		to: Option<&str>,
		options: &TxOptions,
		best_effort_sender: bool,
	) -> Result<TransactionRequest, TxError> {
		let to = to.map(str::trim).filter(|to| !to.is_empty());
		if to.is_none() && !options.has_calldata() {
			return Err(TxError::NoDestination);
		}

		let to = match to {
			Some(to) => Some(self.names.resolve(to, None).await?),
			None => None,
		};
		let from = self.resolve_sender(options, best_effort_sender).await?;

		Ok(TransactionRequest {
			from,
			to,
			value: options.value.unwrap_or_default(),
			data: options.data.clone(),
			gas: options.gas,
			gas_price: options.gas_price,
			max_fee_per_gas: options.max_fee_per_gas,
			max_priority_fee_per_gas: options.max_priority_fee_per_gas,
			nonce: options.nonce,
			chain_id: options.chain_id,
		})
	}

	/// Executes the transaction without submitting it and returns its output.
	pub async fn call(&self, to: Option<&str>, options: &TxOptions) -> Result<Bytes, TxError> {
		let request = self.build_request(to, options, true).await?;
		Ok(self
			.rpc
			.call(
				&request,
				options.block.unwrap_or_default(),
				options.state_override.as_ref(),
			)
			.await?)
	}

	/// The node's gas estimate, without the configured bonus.
	pub async fn estimate_gas(&self, to: Option<&str>, options: &TxOptions) -> Result<u64, TxError> {
		let request = self.build_request(to, options, true).await?;
		Ok(self.rpc.estimate_gas(&request, options.block).await?)
	}

	/// Sends `amount` to `to`.
	pub async fn transfer(
		&self,
		to: &str,
		amount: U256,
		options: &TxOptions,
	) -> Result<PendingTransaction, TxError> {
		let options = TxOptions {
			value: Some(amount),
			..options.clone()
		};
		self.send(Some(to), &options).await
	}

	/// Completes, signs (locally or by the node) and submits a transaction.
	///
	/// `to` may be omitted for contract creation, in which case `data` must
	/// carry the init code.
	#[instrument(skip_all, fields(to = ?to))]
	pub async fn send(
		&self,
		to: Option<&str>,
		options: &TxOptions,
	) -> Result<PendingTransaction, TxError> {
		if options.gas_price.is_some()
			&& (options.max_fee_per_gas.is_some() || options.max_priority_fee_per_gas.is_some())
		{
			return Err(TxError::ConflictingFees);
		}
		let mut request = self.build_request(to, options, false).await?;
		let from = request.from.ok_or(TxError::CannotDetermineCaller)?;

		if request.nonce.is_none() {
			request.nonce = Some(
				self.rpc
					.transaction_count(from, BlockDirective::PENDING)
					.await?,
			);
		}
		if request.gas.is_none() {
			request.gas = Some(self.pricer.estimate_gas_limit(&request).await?);
		}
		let chain_id = match request.chain_id {
			Some(chain_id) => chain_id,
			None => self.rpc.chain_id().await?,
		};
		request.chain_id = Some(chain_id);

		let rules = self.pricer.active_rules().await?;
		self.complete_fees(&mut request, rules).await?;

		let hash = match self.signing_key(options) {
			Some(key) => {
				let encoding = encoding_for(rules, &request);
				let unsigned = unsigned_transaction(&request, encoding, rules.eip155, chain_id);
				let raw = self.signer.sign_transaction(key, &unsigned, encoding).await?;
				self.rpc.send_raw_transaction(&raw).await?
			},
			None => self.rpc.send_transaction(&request).await?,
		};

		tracing::info!(
			tx_hash = %hash,
			%from,
			nonce = request.nonce,
			gas = request.gas,
			"Submitted transaction"
		);
		Ok(self.tracker.track(hash))
	}

	/// Fills the fee fields the caller left unset. Supplied fee-market
	/// fields are completed and kept; a supplied gas price stands alone;
	/// with no fee fields at all, `rules` decide.
	async fn complete_fees(
		&self,
		request: &mut TransactionRequest,
		rules: RuleSet,
	) -> Result<(), TxError> {
		let fees = if request.has_fee_market_fields() {
			self.pricer
				.complete_fee_market(request.max_fee_per_gas, request.max_priority_fee_per_gas)
				.await?
		} else if request.gas_price.is_some() {
			return Ok(());
		} else {
			self.pricer.fees_for(rules).await?
		};
		fees.apply_to(request);
		Ok(())
	}
}

/// Encoding for a priced request. Fee-market fields always sign as a
/// fee-market transaction; a single gas price signs under the rule's
/// encoding, or as legacy where the rule expects fee-market fields.
fn encoding_for(rules: RuleSet, request: &TransactionRequest) -> TxEncoding {
	if request.max_fee_per_gas.is_some() {
		return TxEncoding::FeeMarket;
	}
	match rules.encoding {
		TxEncoding::FeeMarket => TxEncoding::Legacy,
		encoding => encoding,
	}
}

/// Typed encodings always carry the chain id; legacy ones only under EIP-155.
fn unsigned_transaction(
	request: &TransactionRequest,
	encoding: TxEncoding,
	eip155: bool,
	chain_id: u64,
) -> UnsignedTransaction {
	let replay_protected = eip155 || encoding != TxEncoding::Legacy;
	UnsignedTransaction {
		chain_id: replay_protected.then_some(chain_id),
		nonce: request.nonce.unwrap_or_default(),
		to: request.to,
		value: request.value,
		input: request.input(),
		gas_limit: request.gas.unwrap_or_default(),
		gas_price: request.gas_price,
		max_fee_per_gas: request.max_fee_per_gas,
		max_priority_fee_per_gas: request.max_priority_fee_per_gas,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, B256};
	use async_trait::async_trait;
	use evm_account::{AccountError, LocalSigner};
	use evm_config::GasConfig;
	use evm_rpc::MockTransport;
	use evm_types::{HardforkRule, HardforkSchedule};
	use mockall::mock;
	use serde_json::json;
	use std::collections::HashMap;
	use std::time::Duration;

	mock! {
		pub Signer {}

		#[async_trait]
		impl SignerInterface for Signer {
			fn derive_address(&self, key: &SecretString) -> Result<Address, AccountError>;

			async fn sign_transaction(
				&self,
				key: &SecretString,
				tx: &UnsignedTransaction,
				encoding: TxEncoding,
			) -> Result<Bytes, AccountError>;
		}
	}

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const TEST_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const RECIPIENT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
	const LEGACY_CHAIN: u64 = 1_337;
	const FEE_MARKET_CHAIN: u64 = 31_337;

	fn schedule() -> HardforkSchedule {
		HardforkSchedule::empty(RuleSet::new(TxEncoding::Legacy, true))
			.with_chain(
				LEGACY_CHAIN,
				vec![HardforkRule::new(0, TxEncoding::Legacy, true)],
			)
			.with_chain(
				FEE_MARKET_CHAIN,
				vec![HardforkRule::new(0, TxEncoding::FeeMarket, true)],
			)
	}

	fn manager_with(
		mock: Arc<MockTransport>,
		signer: Arc<dyn SignerInterface>,
		default_key: Option<SecretString>,
	) -> TransactionManager {
		let rpc = Arc::new(RpcClient::new(mock));
		let names = Arc::new(NameResolver::new(
			rpc.clone(),
			HashMap::new(),
			Duration::from_secs(3600),
			None,
		));
		let pricer = Arc::new(GasPricer::new(
			rpc.clone(),
			GasConfig {
				gas_bonus: 0.0,
				gas_price_bonus: 0.0,
				min_gas_price: None,
				max_gas_price: None,
			},
			schedule(),
		));
		let tracker = Arc::new(ConfirmationTracker::new(
			rpc.clone(),
			Duration::from_secs(1),
			None,
		));
		TransactionManager::new(rpc, names, pricer, signer, tracker, default_key)
	}

	fn script_chain(mock: &MockTransport, chain_id: u64) {
		mock.respond("eth_chainId", json!(format!("0x{:x}", chain_id)))
			.respond("eth_blockNumber", json!("0x10"))
			.respond("eth_getTransactionCount", json!("0x7"))
			.respond("eth_estimateGas", json!("0x5208"))
			.respond("eth_gasPrice", json!("0x3b9aca00"))
			.respond("eth_maxPriorityFeePerGas", json!("0x3b9aca00"))
			.respond(
				"eth_getBlockByNumber",
				json!({
					"number": "0x11",
					"parentHash": B256::ZERO.to_string(),
					"timestamp": "0x1",
					"gasLimit": "0x1c9c380",
					"gasUsed": "0x0",
					"baseFeePerGas": "0x77359400",
				}),
			)
			.respond("eth_sendRawTransaction", json!(B256::repeat_byte(0x42).to_string()))
			.respond("eth_sendTransaction", json!(B256::repeat_byte(0x43).to_string()));
	}

	#[tokio::test]
	async fn test_no_destination_fails_before_io() {
		let mock = Arc::new(MockTransport::new());
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let error = manager.call(None, &TxOptions::default()).await.unwrap_err();
		assert!(matches!(error, TxError::NoDestination));

		let options = TxOptions {
			data: Some(Bytes::new()),
			..Default::default()
		};
		let error = manager.send(Some(" "), &options).await.unwrap_err();
		assert!(matches!(error, TxError::NoDestination));
		assert_eq!(mock.total_calls(), 0);
	}

	#[tokio::test]
	async fn test_send_without_caller_fails_before_gas_and_nonce() {
		let mock = Arc::new(MockTransport::new());
		mock.respond("eth_accounts", json!([]));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let error = manager
			.send(Some(&RECIPIENT.to_string()), &TxOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(error, TxError::CannotDetermineCaller));
		assert_eq!(mock.call_count("eth_accounts"), 1);
		assert_eq!(mock.call_count("eth_estimateGas"), 0);
		assert_eq!(mock.call_count("eth_getTransactionCount"), 0);
		assert_eq!(mock.call_count("eth_gasPrice"), 0);
	}

	#[tokio::test]
	async fn test_send_signs_fee_market_transaction() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, FEE_MARKET_CHAIN);

		let mut signer = MockSigner::new();
		signer
			.expect_derive_address()
			.returning(|_| Ok(TEST_ADDRESS));
		signer
			.expect_sign_transaction()
			.withf(|_, tx: &UnsignedTransaction, encoding: &TxEncoding| {
				*encoding == TxEncoding::FeeMarket
					&& tx.chain_id == Some(FEE_MARKET_CHAIN)
					&& tx.nonce == 7
					&& tx.gas_limit == 21_000
					&& tx.gas_price.is_none()
					&& tx.max_priority_fee_per_gas == Some(U256::from(1_000_000_000u64))
					&& tx.max_fee_per_gas == Some(U256::from(3_000_000_000u64))
			})
			.times(1)
			.returning(|_, _, _| Ok(Bytes::from(vec![0x02, 0xf8])));

		let manager = manager_with(
			mock.clone(),
			Arc::new(signer),
			Some(SecretString::from(TEST_KEY)),
		);
		let pending = manager
			.transfer(&RECIPIENT.to_string(), U256::from(1u64), &TxOptions::default())
			.await
			.unwrap();

		assert_eq!(pending.hash(), B256::repeat_byte(0x42));
		let raw = &mock.requests_for("eth_sendRawTransaction")[0];
		assert_eq!(raw.params, json!(["0x02f8"]));
		assert_eq!(mock.call_count("eth_sendTransaction"), 0);
		assert_eq!(mock.call_count("eth_accounts"), 0);
	}

	#[tokio::test]
	async fn test_send_signs_legacy_transaction_with_local_signer() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, LEGACY_CHAIN);
		let manager = manager_with(
			mock.clone(),
			Arc::new(LocalSigner),
			Some(SecretString::from(TEST_KEY)),
		);

		manager
			.transfer(&RECIPIENT.to_string(), U256::from(5u64), &TxOptions::default())
			.await
			.unwrap();

		let raw = &mock.requests_for("eth_sendRawTransaction")[0];
		let encoded = raw.params[0].as_str().unwrap();
		// RLP list prefix, no EIP-2718 type byte.
		let first = u8::from_str_radix(&encoded[2..4], 16).unwrap();
		assert!(first >= 0xc0);
		assert_eq!(mock.call_count("eth_maxPriorityFeePerGas"), 0);

		let sender = &mock.requests_for("eth_getTransactionCount")[0];
		assert_eq!(
			sender.params[0].as_str().unwrap().to_lowercase(),
			TEST_ADDRESS.to_string().to_lowercase()
		);
		assert_eq!(sender.params[1], json!("pending"));
	}

	#[tokio::test]
	async fn test_send_without_key_uses_node_custody() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, FEE_MARKET_CHAIN);
		mock.respond("eth_accounts", json!([TEST_ADDRESS.to_string()]));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			nonce: Some(3),
			gas: Some(50_000),
			gas_price: Some(U256::from(9u64)),
			..Default::default()
		};
		let pending = manager
			.send(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();
		assert_eq!(pending.hash(), B256::repeat_byte(0x43));

		assert_eq!(mock.call_count("eth_getTransactionCount"), 0);
		assert_eq!(mock.call_count("eth_estimateGas"), 0);
		assert_eq!(mock.call_count("eth_gasPrice"), 0);

		let sent = &mock.requests_for("eth_sendTransaction")[0].params[0];
		assert_eq!(sent["nonce"], json!("0x3"));
		assert_eq!(sent["gas"], json!("0xc350"));
		assert_eq!(sent["gasPrice"], json!("0x9"));
		assert_eq!(sent["chainId"], json!("0x7a69"));
		assert_eq!(sent["value"], json!("0x0"));
	}

	#[tokio::test]
	async fn test_sender_by_account_index() {
		let mock = Arc::new(MockTransport::new());
		let second = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
		mock.respond(
			"eth_accounts",
			json!([TEST_ADDRESS.to_string(), second.to_string()]),
		)
		.respond("eth_call", json!("0x01"));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			from: Some(Sender::Index(1)),
			data: Some(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])),
			..Default::default()
		};
		let output = manager
			.call(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();
		assert_eq!(output, Bytes::from(vec![0x01]));

		let call = &mock.requests_for("eth_call")[0].params;
		assert_eq!(
			call[0]["from"].as_str().unwrap().to_lowercase(),
			second.to_string().to_lowercase()
		);
		assert_eq!(call[1], json!("latest"));
	}

	#[tokio::test]
	async fn test_estimate_returns_raw_node_figure() {
		let mock = Arc::new(MockTransport::new());
		mock.respond("eth_accounts", json!([]))
			.respond("eth_estimateGas", json!("0x5208"));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			data: Some(Bytes::from(vec![0x60, 0x80])),
			..Default::default()
		};
		assert_eq!(manager.estimate_gas(None, &options).await.unwrap(), 21_000);
		let sent = &mock.requests_for("eth_estimateGas")[0].params[0];
		assert!(sent.get("to").is_none());
		assert!(sent.get("from").is_none());
	}

	#[tokio::test]
	async fn test_call_without_node_accounts() {
		let mock = Arc::new(MockTransport::new());
		mock.respond_error("eth_accounts", -32601, "the method eth_accounts does not exist", None)
			.respond("eth_call", json!("0x2a"))
			.respond("eth_estimateGas", json!("0x5208"));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			data: Some(Bytes::from(vec![0x70, 0xa0, 0x82, 0x31])),
			..Default::default()
		};
		let output = manager
			.call(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();
		assert_eq!(output, Bytes::from(vec![0x2a]));
		assert!(mock.requests_for("eth_call")[0].params[0]
			.get("from")
			.is_none());

		let options = TxOptions {
			from: Some(Sender::Index(4)),
			..options
		};
		assert_eq!(
			manager
				.estimate_gas(Some(&RECIPIENT.to_string()), &options)
				.await
				.unwrap(),
			21_000
		);

		// Submitting still needs a sender.
		let error = manager
			.send(Some(&RECIPIENT.to_string()), &TxOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(error, TxError::Rpc(_)));
		assert_eq!(mock.call_count("eth_getTransactionCount"), 0);
	}

	#[tokio::test]
	async fn test_send_keeps_supplied_priority_fee() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, FEE_MARKET_CHAIN);
		mock.respond("eth_accounts", json!([TEST_ADDRESS.to_string()]));
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			max_priority_fee_per_gas: Some(U256::from(7u64)),
			..Default::default()
		};
		manager
			.send(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();

		let sent = &mock.requests_for("eth_sendTransaction")[0].params[0];
		assert_eq!(sent["maxPriorityFeePerGas"], json!("0x7"));
		// Pending base fee of 2 gwei plus the priority fee.
		assert_eq!(sent["maxFeePerGas"], json!("0x77359407"));
		assert!(sent.get("gasPrice").is_none());
		assert_eq!(mock.call_count("eth_maxPriorityFeePerGas"), 0);
	}

	#[tokio::test]
	async fn test_send_signs_with_supplied_max_fee_only() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, FEE_MARKET_CHAIN);

		let mut signer = MockSigner::new();
		signer
			.expect_derive_address()
			.returning(|_| Ok(TEST_ADDRESS));
		signer
			.expect_sign_transaction()
			.withf(|_, tx: &UnsignedTransaction, encoding: &TxEncoding| {
				*encoding == TxEncoding::FeeMarket
					&& tx.gas_price.is_none()
					&& tx.max_fee_per_gas == Some(U256::from(5_000_000_000u64))
					&& tx.max_priority_fee_per_gas == Some(U256::from(1_000_000_000u64))
			})
			.times(1)
			.returning(|_, _, _| Ok(Bytes::from(vec![0x02, 0xf8])));

		let manager = manager_with(
			mock.clone(),
			Arc::new(signer),
			Some(SecretString::from(TEST_KEY)),
		);
		let options = TxOptions {
			max_fee_per_gas: Some(U256::from(5_000_000_000u64)),
			..Default::default()
		};
		manager
			.send(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();
		assert_eq!(mock.call_count("eth_sendRawTransaction"), 1);
	}

	#[tokio::test]
	async fn test_fee_market_fields_on_legacy_chain() {
		let mock = Arc::new(MockTransport::new());
		script_chain(&mock, LEGACY_CHAIN);
		let manager = manager_with(
			mock.clone(),
			Arc::new(LocalSigner),
			Some(SecretString::from(TEST_KEY)),
		);

		let options = TxOptions {
			max_fee_per_gas: Some(U256::from(3_000_000_000u64)),
			max_priority_fee_per_gas: Some(U256::from(1_000_000_000u64)),
			..Default::default()
		};
		manager
			.send(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap();

		let raw = &mock.requests_for("eth_sendRawTransaction")[0];
		assert!(raw.params[0].as_str().unwrap().starts_with("0x02"));
		assert_eq!(mock.call_count("eth_gasPrice"), 0);
		assert_eq!(mock.call_count("eth_maxPriorityFeePerGas"), 0);
	}

	#[tokio::test]
	async fn test_gas_price_with_fee_market_fields_is_rejected() {
		let mock = Arc::new(MockTransport::new());
		let manager = manager_with(mock.clone(), Arc::new(LocalSigner), None);

		let options = TxOptions {
			gas_price: Some(U256::from(1u64)),
			max_priority_fee_per_gas: Some(U256::from(1u64)),
			..Default::default()
		};
		let error = manager
			.send(Some(&RECIPIENT.to_string()), &options)
			.await
			.unwrap_err();
		assert!(matches!(error, TxError::ConflictingFees));
		assert_eq!(mock.total_calls(), 0);
	}

	#[test]
	fn test_encoding_follows_fee_fields() {
		let fee_market_rules = RuleSet::new(TxEncoding::FeeMarket, true);
		let priced = TransactionRequest {
			gas_price: Some(U256::from(1u64)),
			..Default::default()
		};
		assert_eq!(encoding_for(fee_market_rules, &priced), TxEncoding::Legacy);
		assert_eq!(
			encoding_for(RuleSet::new(TxEncoding::AccessList, true), &priced),
			TxEncoding::AccessList
		);

		let fee_market = TransactionRequest {
			max_fee_per_gas: Some(U256::from(2u64)),
			max_priority_fee_per_gas: Some(U256::from(1u64)),
			..Default::default()
		};
		let legacy_rules = RuleSet::new(TxEncoding::Legacy, false);
		assert_eq!(encoding_for(fee_market_rules, &fee_market), TxEncoding::FeeMarket);
		assert_eq!(encoding_for(legacy_rules, &fee_market), TxEncoding::FeeMarket);

		let unsigned = unsigned_transaction(&priced, TxEncoding::Legacy, false, 1);
		assert_eq!(unsigned.chain_id, None);
		let unsigned = unsigned_transaction(&fee_market, TxEncoding::FeeMarket, false, 1);
		assert_eq!(unsigned.chain_id, Some(1));
	}
}
