//! Static chain data.
//!
//! Two tables keyed by chain id: the name registry contract used for name
//! resolution, and the hardfork schedule deciding how transactions are
//! encoded and priced at a given block. Both are configuration data; the
//! config layer may add or replace entries.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name registry deployed at the same address on mainnet and the public testnets.
const NAME_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Built-in chain id → name registry table.
pub fn default_name_registries() -> HashMap<u64, Address> {
	[1u64, 5, 17_000, 11_155_111]
		.into_iter()
		.map(|chain_id| (chain_id, NAME_REGISTRY))
		.collect()
}

/// Wire encoding of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxEncoding {
	/// Pre-Berlin RLP transaction with a single gas price.
	Legacy,
	/// EIP-2930 typed transaction carrying an access list.
	AccessList,
	/// EIP-1559 transaction with base/priority fee fields.
	FeeMarket,
}

/// Rules in force from a given block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
	pub encoding: TxEncoding,
	/// Whether signatures commit to the chain id (EIP-155).
	#[serde(default = "default_eip155")]
	pub eip155: bool,
}

fn default_eip155() -> bool {
	true
}

impl RuleSet {
	pub const fn new(encoding: TxEncoding, eip155: bool) -> Self {
		Self { encoding, eip155 }
	}

	pub fn uses_fee_market(&self) -> bool {
		self.encoding == TxEncoding::FeeMarket
	}
}

/// A rule set activated at `activation_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardforkRule {
	pub activation_block: u64,
	#[serde(flatten)]
	pub rules: RuleSet,
}

impl HardforkRule {
	pub const fn new(activation_block: u64, encoding: TxEncoding, eip155: bool) -> Self {
		Self {
			activation_block,
			rules: RuleSet::new(encoding, eip155),
		}
	}
}

/// Rules for chains absent from the schedule.
pub const DEFAULT_RULES: RuleSet = RuleSet::new(TxEncoding::Legacy, true);

/// Built-in hardfork schedules for well-known chains.
pub fn default_hardforks() -> HashMap<u64, Vec<HardforkRule>> {
	use TxEncoding::*;

	let mut table = HashMap::new();
	table.insert(
		1,
		vec![
			HardforkRule::new(12_965_000, FeeMarket, true), // london
			HardforkRule::new(12_244_000, AccessList, true), // berlin
			HardforkRule::new(2_675_000, Legacy, true),     // spurious dragon
			HardforkRule::new(0, Legacy, false),
		],
	);
	table.insert(
		5,
		vec![
			HardforkRule::new(5_062_605, FeeMarket, true),
			HardforkRule::new(4_460_644, AccessList, true),
			HardforkRule::new(0, Legacy, true),
		],
	);
	for chain_id in [17_000u64, 11_155_111, 31_337, 1_337] {
		table.insert(chain_id, vec![HardforkRule::new(0, FeeMarket, true)]);
	}
	table
}

/// Per-chain hardfork rules, each list kept sorted by descending activation block.
#[derive(Debug, Clone)]
pub struct HardforkSchedule {
	chains: HashMap<u64, Vec<HardforkRule>>,
	default: RuleSet,
}

impl Default for HardforkSchedule {
	fn default() -> Self {
		let mut schedule = Self {
			chains: HashMap::new(),
			default: DEFAULT_RULES,
		};
		for (chain_id, rules) in default_hardforks() {
			schedule.set_chain(chain_id, rules);
		}
		schedule
	}
}

impl HardforkSchedule {
	/// Empty schedule; every lookup returns `default`.
	pub fn empty(default: RuleSet) -> Self {
		Self {
			chains: HashMap::new(),
			default,
		}
	}

	/// Replaces the rule list of one chain.
	pub fn set_chain(&mut self, chain_id: u64, mut rules: Vec<HardforkRule>) {
		rules.sort_by(|a, b| b.activation_block.cmp(&a.activation_block));
		self.chains.insert(chain_id, rules);
	}

	pub fn with_chain(mut self, chain_id: u64, rules: Vec<HardforkRule>) -> Self {
		self.set_chain(chain_id, rules);
		self
	}

	/// Rules in force on `chain_id` at `block`.
	///
	/// Scans the chain's list from the highest activation block down and
	/// returns the first rule already active. Unknown chains, and blocks
	/// older than every listed rule, get the default rule set.
	pub fn rules_for(&self, chain_id: u64, block: u64) -> RuleSet {
		self.chains
			.get(&chain_id)
			.and_then(|rules| rules.iter().find(|rule| rule.activation_block <= block))
			.map(|rule| rule.rules)
			.unwrap_or(self.default)
	}
}
