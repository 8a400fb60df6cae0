//! Fluent construction of `Config` values for tests.

use crate::{
	AccountConfig, ChainConfig, Config, ConfirmationConfig, GasConfig, NamesConfig,
	TransportConfig,
};
use evm_types::{Address, HardforkRule, SecretString};
use std::collections::HashMap;

/// Builds a `Config` with test-friendly defaults: a short poll interval and
/// no fee bonuses, so expected values can be read straight off the mocks.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	url: String,
	gas_bonus: f64,
	gas_price_bonus: f64,
	min_gas_price: Option<u64>,
	max_gas_price: Option<u64>,
	min_ttl_ms: u64,
	max_ttl_ms: Option<u64>,
	poll_interval_ms: u64,
	max_confirmations: Option<u64>,
	private_key: Option<SecretString>,
	chains: HashMap<u64, ChainConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			url: "http://localhost:8545".to_string(),
			gas_bonus: 0.0,
			gas_price_bonus: 0.0,
			min_gas_price: None,
			max_gas_price: None,
			min_ttl_ms: 60 * 60 * 1000,
			max_ttl_ms: None,
			poll_interval_ms: 100,
			max_confirmations: None,
			private_key: None,
			chains: HashMap::new(),
		}
	}

	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	pub fn gas_bonus(mut self, bonus: f64) -> Self {
		self.gas_bonus = bonus;
		self
	}

	pub fn gas_price_bonus(mut self, bonus: f64) -> Self {
		self.gas_price_bonus = bonus;
		self
	}

	pub fn gas_price_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
		self.min_gas_price = min;
		self.max_gas_price = max;
		self
	}

	pub fn ttl_bounds(mut self, min_ms: u64, max_ms: Option<u64>) -> Self {
		self.min_ttl_ms = min_ms;
		self.max_ttl_ms = max_ms;
		self
	}

	pub fn poll_interval_ms(mut self, interval: u64) -> Self {
		self.poll_interval_ms = interval;
		self
	}

	pub fn max_confirmations(mut self, cap: Option<u64>) -> Self {
		self.max_confirmations = cap;
		self
	}

	pub fn private_key(mut self, key: &str) -> Self {
		self.private_key = Some(SecretString::from(key));
		self
	}

	pub fn name_registry(mut self, chain_id: u64, registry: Address) -> Self {
		self.chains.entry(chain_id).or_default().name_registry = Some(registry);
		self
	}

	pub fn hardforks(mut self, chain_id: u64, rules: Vec<HardforkRule>) -> Self {
		self.chains.entry(chain_id).or_default().hardforks = Some(rules);
		self
	}

	pub fn build(self) -> Config {
		Config {
			transport: TransportConfig {
				url: self.url,
				..TransportConfig::default()
			},
			gas: GasConfig {
				gas_bonus: self.gas_bonus,
				gas_price_bonus: self.gas_price_bonus,
				min_gas_price: self.min_gas_price,
				max_gas_price: self.max_gas_price,
			},
			names: NamesConfig {
				min_ttl_ms: self.min_ttl_ms,
				max_ttl_ms: self.max_ttl_ms,
			},
			confirmation: ConfirmationConfig {
				poll_interval_ms: self.poll_interval_ms,
				max_confirmations: self.max_confirmations,
			},
			account: AccountConfig {
				private_key: self.private_key,
			},
			chains: self.chains,
		}
	}
}
