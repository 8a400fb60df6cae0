//! Assembles an [`EvmClient`] from configuration.
//!
//! The transport and the signer can be replaced, e.g. with a host-provided
//! callback transport or a hardware signer; everything else is derived
//! from the config.

use crate::client::EvmClient;
use crate::lifecycle::TransactionManager;
use crate::monitoring::ConfirmationTracker;
use crate::pricing::GasPricer;
use crate::ClientError;
use evm_account::{LocalSigner, SignerInterface};
use evm_config::Config;
use evm_names::NameResolver;
use evm_rpc::{create_transport, RpcClient, TransportInterface};
use std::sync::Arc;

pub struct ClientBuilder {
	config: Config,
	transport: Option<Arc<dyn TransportInterface>>,
	signer: Option<Arc<dyn SignerInterface>>,
}

impl ClientBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			transport: None,
			signer: None,
		}
	}

	/// Uses `transport` instead of one built from `[transport]`.
	pub fn with_transport(mut self, transport: Arc<dyn TransportInterface>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Uses `signer` instead of the local key signer.
	pub fn with_signer(mut self, signer: Arc<dyn SignerInterface>) -> Self {
		self.signer = Some(signer);
		self
	}

	/// Validates the config and wires every component.
	pub fn build(self) -> Result<EvmClient, ClientError> {
		let config = self.config;
		config.validate()?;

		let transport = match self.transport {
			Some(transport) => transport,
			None => {
				let transport = create_transport(&config.transport)?;
				tracing::info!(component = "transport", url = %config.transport.url, "Loaded");
				transport
			},
		};
		let rpc = Arc::new(RpcClient::new(transport));

		let names = Arc::new(NameResolver::from_config(rpc.clone(), &config));
		let pricer = Arc::new(GasPricer::new(
			rpc.clone(),
			config.gas.clone(),
			config.hardfork_schedule(),
		));
		let tracker = Arc::new(ConfirmationTracker::new(
			rpc.clone(),
			config.confirmation.poll_interval(),
			config.confirmation.max_confirmations,
		));
		let signer = self
			.signer
			.unwrap_or_else(|| Arc::new(LocalSigner) as Arc<dyn SignerInterface>);
		let default_key = config.account.private_key().cloned();
		tracing::info!(
			component = "account",
			local_signing = default_key.is_some(),
			"Loaded"
		);

		let transactions = TransactionManager::new(
			rpc.clone(),
			names.clone(),
			pricer.clone(),
			signer,
			tracker.clone(),
			default_key,
		);

		Ok(EvmClient::new(rpc, names, pricer, tracker, transactions))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{TxError, TxOptions};
	use alloy_primitives::{address, Address, B256, U256};
	use evm_config::builders::config::ConfigBuilder;
	use evm_rpc::MockTransport;
	use evm_types::{BlockDirective, BlockRef};
	use serde_json::{json, Value};

	const REGISTRY: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
	const RESOLVER: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
	const ALICE: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	// resolver(bytes32), addr(bytes32), ttl(bytes32)
	const RESOLVER_SELECTOR: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
	const ADDR_SELECTOR: [u8; 4] = [0x3b, 0x3b, 0x57, 0xde];
	const TTL_SELECTOR: [u8; 4] = [0x16, 0xa2, 0x5c, 0xbd];

	fn address_word(address: Address) -> Value {
		json!(format!("0x{:0>64}", address.to_string()[2..].to_lowercase()))
	}

	fn setup(config: ConfigBuilder) -> (Arc<MockTransport>, EvmClient) {
		let mock = Arc::new(MockTransport::new());
		mock.respond("eth_chainId", json!("0x7a69"));
		let client = ClientBuilder::new(config.name_registry(31_337, REGISTRY).build())
			.with_transport(mock.clone())
			.build()
			.unwrap();
		(mock, client)
	}

	fn script_name(mock: &MockTransport) {
		mock.respond_call(REGISTRY, RESOLVER_SELECTOR, address_word(RESOLVER))
			.respond_call(RESOLVER, ADDR_SELECTOR, address_word(ALICE))
			.respond_call(REGISTRY, TTL_SELECTOR, json!(format!("0x{:064x}", 3600)));
	}

	#[test]
	fn test_invalid_config_is_rejected() {
		let config = ConfigBuilder::new().url("ftp://localhost").build();
		let result = ClientBuilder::new(config).build();
		assert!(matches!(result, Err(ClientError::Config(_))));
	}

	#[tokio::test]
	async fn test_balance_by_name() {
		let (mock, client) = setup(ConfigBuilder::new());
		script_name(&mock);
		mock.respond("eth_getBalance", json!("0xde0b6b3a7640000"));

		let balance = client.get_balance("alice.eth", None).await.unwrap();
		assert_eq!(balance, U256::from(1_000_000_000_000_000_000u64));

		let request = &mock.requests_for("eth_getBalance")[0];
		assert_eq!(
			request.params[0].as_str().unwrap().to_lowercase(),
			ALICE.to_string().to_lowercase()
		);
		assert_eq!(request.params[1], json!("latest"));
		assert_eq!(client.resolve("Alice.ETH").await.unwrap(), ALICE);
		assert_eq!(mock.call_count("eth_call"), 3);
	}

	#[tokio::test]
	async fn test_balance_by_name_behind_head_reads_one_block() {
		let (mock, client) = setup(ConfigBuilder::new());
		script_name(&mock);
		mock.respond("eth_blockNumber", json!("0x64"))
			.respond("eth_blockNumber", json!("0x65"))
			.respond("eth_getBalance", json!("0x1"));

		client
			.get_balance("alice.eth", Some(BlockDirective::Behind(5)))
			.await
			.unwrap();

		assert_eq!(mock.call_count("eth_blockNumber"), 1);
		for call in mock.requests_for("eth_call") {
			assert_eq!(call.params[1], json!("0x60"));
		}
		let balance = &mock.requests_for("eth_getBalance")[0];
		assert_eq!(balance.params[1], json!("0x60"));
	}

	#[tokio::test]
	async fn test_gas_price_has_bonus() {
		let (mock, client) = setup(ConfigBuilder::new().gas_price_bonus(0.5));
		mock.respond("eth_gasPrice", json!("0x64"));
		assert_eq!(client.get_gas_price().await.unwrap(), U256::from(150u64));
	}

	#[tokio::test]
	async fn test_block_queries() {
		let (mock, client) = setup(ConfigBuilder::new());
		mock.respond("eth_blockNumber", json!("0x64"))
			.respond("eth_getBlockByNumber", Value::Null);

		assert_eq!(client.get_block_number().await.unwrap(), 100);
		let block = client
			.get_block(BlockRef::Directive(BlockDirective::Behind(10)), false)
			.await
			.unwrap();
		assert!(block.is_none());
		let request = &mock.requests_for("eth_getBlockByNumber")[0];
		assert_eq!(request.params, json!(["0x5b", false]));
	}

	#[tokio::test(start_paused = true)]
	async fn test_transfer_and_confirm() {
		let (mock, client) = setup(ConfigBuilder::new().private_key(TEST_KEY));
		let hash = B256::repeat_byte(0x42);
		mock.respond("eth_blockNumber", json!("0x10"))
			.respond("eth_getTransactionCount", json!("0x0"))
			.respond("eth_estimateGas", json!("0x5208"))
			.respond("eth_maxPriorityFeePerGas", json!("0x1"))
			.respond(
				"eth_getBlockByNumber",
				json!({
					"number": "0x11",
					"parentHash": B256::ZERO.to_string(),
					"timestamp": "0x1",
					"gasLimit": "0x1c9c380",
					"gasUsed": "0x0",
					"baseFeePerGas": "0x7",
				}),
			)
			.respond("eth_sendRawTransaction", json!(hash.to_string()))
			.respond("eth_getTransactionReceipt", Value::Null)
			.respond(
				"eth_getTransactionReceipt",
				json!({
					"transactionHash": hash.to_string(),
					"blockNumber": "0x11",
					"gasUsed": "0x5208",
					"status": "0x1",
				}),
			);

		let error = client
			.transfer("alice.eth", U256::from(1u64), &TxOptions::default())
			.await
			.unwrap_err();
		// No registry reply scripted: the name cannot be resolved.
		assert!(matches!(error, ClientError::Transaction(TxError::Names(_))));

		let pending = client
			.transfer(&ALICE.to_string(), U256::from(1u64), &TxOptions::default())
			.await
			.unwrap();
		assert_eq!(pending.hash(), hash);

		let raw = mock.requests_for("eth_sendRawTransaction")[0].params[0]
			.as_str()
			.unwrap()
			.to_string();
		assert!(raw.starts_with("0x02"));

		let receipt = pending.receipt().await.unwrap();
		assert_eq!(receipt.block_number, 17);
		assert_eq!(mock.call_count("eth_accounts"), 0);
	}
}
