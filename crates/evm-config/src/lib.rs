//! Configuration for the EVM client runtime.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${NAME}` or `${NAME:-default}`; they are expanded before the
//! document is parsed.
//!
//! ## Modular configuration
//!
//! A file may pull in others with `include = ["chains.toml"]`. Every
//! top-level section must appear in exactly one file, and a file may only be
//! loaded once per load (circular includes are rejected).

#[cfg(feature = "testing")]
pub mod builders {
	pub mod config;
}
mod loader;

pub use loader::ConfigLoader;

use evm_types::{default_name_registries, Address, HardforkRule, HardforkSchedule, SecretString};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input; keep only the message.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	/// How to reach the node.
	#[serde(default)]
	pub transport: TransportConfig,
	#[serde(default)]
	pub gas: GasConfig,
	#[serde(default)]
	pub names: NamesConfig,
	#[serde(default)]
	pub confirmation: ConfirmationConfig,
	#[serde(default)]
	pub account: AccountConfig,
	/// Per-chain overrides of the built-in chain table, keyed by chain id.
	#[serde(default, deserialize_with = "deserialize_chains")]
	pub chains: HashMap<u64, ChainConfig>,
}

/// Supported transport adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
	#[default]
	Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
	#[serde(default)]
	pub kind: TransportKind,
	pub url: String,
	/// Per-request timeout. Defaults to 30 seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Extra headers sent with every request (API keys and the like).
	#[serde(default)]
	pub headers: HashMap<String, String>,
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			kind: TransportKind::Http,
			url: "http://localhost:8545".to_string(),
			timeout_seconds: default_timeout_seconds(),
			headers: HashMap::new(),
		}
	}
}

fn default_timeout_seconds() -> u64 {
	30
}

/// Fee and gas-limit policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasConfig {
	/// Fraction added to the node's gas estimate. `0.5` means +50%.
	#[serde(default = "default_gas_bonus")]
	pub gas_bonus: f64,
	/// Fraction added to gas prices and fees. May be negative.
	#[serde(default = "default_gas_price_bonus")]
	pub gas_price_bonus: f64,
	/// Lower bound for legacy gas prices, in wei.
	pub min_gas_price: Option<u64>,
	/// Upper bound for legacy gas prices and fee-market max fees, in wei.
	pub max_gas_price: Option<u64>,
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			gas_bonus: default_gas_bonus(),
			gas_price_bonus: default_gas_price_bonus(),
			min_gas_price: None,
			max_gas_price: None,
		}
	}
}

fn default_gas_bonus() -> f64 {
	0.5
}

fn default_gas_price_bonus() -> f64 {
	0.05
}

/// Name resolution cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamesConfig {
	/// Minimum cache lifetime. Defaults to one hour.
	#[serde(default = "default_min_ttl_ms")]
	pub min_ttl_ms: u64,
	/// Maximum cache lifetime; unbounded when absent.
	pub max_ttl_ms: Option<u64>,
}

impl Default for NamesConfig {
	fn default() -> Self {
		Self {
			min_ttl_ms: default_min_ttl_ms(),
			max_ttl_ms: None,
		}
	}
}

fn default_min_ttl_ms() -> u64 {
	60 * 60 * 1000
}

impl NamesConfig {
	pub fn min_ttl(&self) -> Duration {
		Duration::from_millis(self.min_ttl_ms)
	}

	pub fn max_ttl(&self) -> Option<Duration> {
		self.max_ttl_ms.map(Duration::from_millis)
	}
}

/// Confirmation tracking policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmationConfig {
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Highest confirmation count a tracker will follow. Uncapped when absent.
	pub max_confirmations: Option<u64>,
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			max_confirmations: None,
		}
	}
}

fn default_poll_interval_ms() -> u64 {
	1000
}

impl ConfirmationConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Default signing key. Without one, transactions are signed by the node.
	pub private_key: Option<SecretString>,
}

impl AccountConfig {
	/// The configured key, ignoring keys that expanded to an empty string.
	pub fn private_key(&self) -> Option<&SecretString> {
		self.private_key.as_ref().filter(|key| !key.is_empty())
	}
}

/// Overrides for one chain.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Name registry contract for this chain.
	pub name_registry: Option<Address>,
	/// Replaces the built-in hardfork list of this chain.
	pub hardforks: Option<Vec<HardforkRule>>,
}

/// Deserializes the `[chains]` table, whose keys TOML can only give as strings.
pub fn deserialize_chains<'de, D>(deserializer: D) -> Result<HashMap<u64, ChainConfig>, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, ChainConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}

/// Expands `${VAR}` and `${VAR:-default}` references.
///
/// Input is limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads a configuration file, following its includes.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;

		let mut loader = ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// A default configuration pointing at `url`.
	pub fn for_url(url: impl Into<String>) -> Self {
		let mut config = Self::default();
		config.transport.url = url.into();
		config
	}

	/// Built-in hardfork table with this configuration's chain overrides applied.
	pub fn hardfork_schedule(&self) -> HardforkSchedule {
		let mut schedule = HardforkSchedule::default();
		for (chain_id, chain) in &self.chains {
			if let Some(rules) = &chain.hardforks {
				schedule.set_chain(*chain_id, rules.clone());
			}
		}
		schedule
	}

	/// Built-in name registry table with this configuration's overrides applied.
	pub fn name_registries(&self) -> HashMap<u64, Address> {
		let mut registries = default_name_registries();
		for (chain_id, chain) in &self.chains {
			if let Some(registry) = chain.name_registry {
				registries.insert(*chain_id, registry);
			}
		}
		registries
	}

	/// Checks value ranges and cross-field constraints.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let url = self.transport.url.trim();
		if url.is_empty() {
			return Err(ConfigError::Validation(
				"transport.url cannot be empty".into(),
			));
		}
		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"transport.url must be an http(s) URL, got '{}'",
				url
			)));
		}
		if self.transport.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"transport.timeout_seconds must be greater than 0".into(),
			));
		}

		for (field, bonus) in [
			("gas_bonus", self.gas.gas_bonus),
			("gas_price_bonus", self.gas.gas_price_bonus),
		] {
			if !bonus.is_finite() || bonus <= -1.0 {
				return Err(ConfigError::Validation(format!(
					"gas.{} must be greater than -1, got {}",
					field, bonus
				)));
			}
		}
		if let (Some(min), Some(max)) = (self.gas.min_gas_price, self.gas.max_gas_price) {
			if min > max {
				return Err(ConfigError::Validation(format!(
					"gas.min_gas_price ({}) exceeds gas.max_gas_price ({})",
					min, max
				)));
			}
		}

		if let Some(max_ttl) = self.names.max_ttl_ms {
			if self.names.min_ttl_ms > max_ttl {
				return Err(ConfigError::Validation(format!(
					"names.min_ttl_ms ({}) exceeds names.max_ttl_ms ({})",
					self.names.min_ttl_ms, max_ttl
				)));
			}
		}

		if self.confirmation.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"confirmation.poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.confirmation.max_confirmations == Some(0) {
			return Err(ConfigError::Validation(
				"confirmation.max_confirmations must be at least 1".into(),
			));
		}

		for (chain_id, chain) in &self.chains {
			if let Some(rules) = &chain.hardforks {
				if rules.is_empty() {
					return Err(ConfigError::Validation(format!(
						"Chain {} declares an empty hardforks list",
						chain_id
					)));
				}
			}
		}

		Ok(())
	}
}

/// Parses a TOML document, expanding environment variables and validating
/// the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_types::TxEncoding;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("EVM_TEST_HOST", "localhost");
		std::env::set_var("EVM_TEST_PORT", "8545");

		let input = "url = \"http://${EVM_TEST_HOST}:${EVM_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("EVM_TEST_HOST");
		std::env::remove_var("EVM_TEST_PORT");
	}

	#[test]
	fn test_env_var_defaults_and_missing() {
		let input = "url = \"${EVM_TEST_UNSET_URL:-http://127.0.0.1:8545}\"";
		assert_eq!(
			resolve_env_vars(input).unwrap(),
			"url = \"http://127.0.0.1:8545\""
		);

		let err = resolve_env_vars("key = \"${EVM_TEST_DEFINITELY_UNSET}\"").unwrap_err();
		assert!(err.to_string().contains("EVM_TEST_DEFINITELY_UNSET"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = r#"
[transport]
url = "http://localhost:8545"
"#
		.parse()
		.unwrap();

		assert_eq!(config.transport.kind, TransportKind::Http);
		assert_eq!(config.transport.timeout_seconds, 30);
		assert_eq!(config.gas.gas_bonus, 0.5);
		assert_eq!(config.gas.gas_price_bonus, 0.05);
		assert_eq!(config.names.min_ttl(), Duration::from_secs(3600));
		assert_eq!(config.names.max_ttl(), None);
		assert_eq!(config.confirmation.poll_interval(), Duration::from_secs(1));
		assert_eq!(config.confirmation.max_confirmations, None);
		assert!(config.account.private_key().is_none());
	}

	#[test]
	fn test_chain_overrides() {
		let config: Config = r#"
[transport]
url = "http://localhost:8545"

[chains.31337]
name_registry = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[[chains.31337.hardforks]]
activation_block = 0
encoding = "legacy"

[[chains.31337.hardforks]]
activation_block = 10
encoding = "access_list"
eip155 = true
"#
		.parse()
		.unwrap();

		let registries = config.name_registries();
		assert_eq!(
			registries.get(&31_337).map(|a| a.to_string()),
			Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string())
		);
		assert!(registries.contains_key(&1));

		let schedule = config.hardfork_schedule();
		assert_eq!(schedule.rules_for(31_337, 5).encoding, TxEncoding::Legacy);
		assert_eq!(schedule.rules_for(31_337, 10).encoding, TxEncoding::AccessList);
		assert!(schedule.rules_for(1, 20_000_000).uses_fee_market());
	}

	#[test]
	fn test_invalid_chain_key() {
		let result: Result<Config, _> = r#"
[transport]
url = "http://localhost:8545"
[chains.mainnet]
"#
		.parse();
		assert!(result.unwrap_err().to_string().contains("Invalid chain_id"));
	}

	#[test]
	fn test_validation_rules() {
		let cases = [
			("[transport]\nurl = \"ws://localhost:8546\"", "http(s)"),
			(
				"[transport]\nurl = \"http://x\"\n[gas]\ngas_price_bonus = -1.0",
				"gas_price_bonus",
			),
			(
				"[transport]\nurl = \"http://x\"\n[gas]\nmin_gas_price = 10\nmax_gas_price = 5",
				"min_gas_price",
			),
			(
				"[transport]\nurl = \"http://x\"\n[names]\nmin_ttl_ms = 10\nmax_ttl_ms = 5",
				"min_ttl_ms",
			),
			(
				"[transport]\nurl = \"http://x\"\n[confirmation]\npoll_interval_ms = 0",
				"poll_interval_ms",
			),
			(
				"[transport]\nurl = \"http://x\"\n[confirmation]\nmax_confirmations = 0",
				"max_confirmations",
			),
			(
				"[transport]\nurl = \"http://x\"\n[chains.5]\nhardforks = []",
				"empty hardforks",
			),
		];

		for (input, expected) in cases {
			let err = input.parse::<Config>().unwrap_err().to_string();
			assert!(err.contains(expected), "{} did not mention {}", err, expected);
		}
	}

	#[test]
	fn test_private_key_is_redacted() {
		let config: Config = r#"
[transport]
url = "http://localhost:8545"
[account]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#
		.parse()
		.unwrap();

		assert!(config.account.private_key().is_some());
		assert!(!format!("{:?}", config).contains("ac0974"));
	}
}
