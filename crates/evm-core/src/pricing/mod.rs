//! Gas limits, gas prices and fee-market fees.
//!
//! Every figure the node reports is adjusted by a configured bonus before
//! use. Which fee fields a transaction carries depends on the hardfork rule
//! in force for the chain at the target block.

use alloy_primitives::U256;
use evm_config::GasConfig;
use evm_rpc::{RpcClient, RpcError};
use evm_types::{BlockDirective, BlockRef, HardforkSchedule, RuleSet, TransactionRequest};
use std::sync::Arc;
use thiserror::Error;

/// Fixed-point scale for bonus factors (parts per billion).
const PPB: u64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum PricingError {
	#[error(transparent)]
	Rpc(#[from] RpcError),
	#[error("Node returned no pending block")]
	MissingPendingBlock,
}

/// Fee fields for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFields {
	Legacy {
		gas_price: U256,
	},
	FeeMarket {
		max_fee_per_gas: U256,
		max_priority_fee_per_gas: U256,
	},
}

impl FeeFields {
	/// Replaces the fee fields of `tx`.
	pub fn apply_to(self, tx: &mut TransactionRequest) {
		tx.clear_fees();
		match self {
			FeeFields::Legacy { gas_price } => tx.gas_price = Some(gas_price),
			FeeFields::FeeMarket {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => {
				tx.max_fee_per_gas = Some(max_fee_per_gas);
				tx.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
			},
		}
	}
}

fn bonus_factor(bonus: f64) -> u64 {
	let factor = ((1.0 + bonus) * PPB as f64).round();
	if factor.is_finite() && factor > 0.0 {
		factor as u64
	} else {
		0
	}
}

/// `round(value × (1 + bonus))`. The bonus may be negative.
pub fn apply_bonus(value: U256, bonus: f64) -> U256 {
	let scaled = value
		.saturating_mul(U256::from(bonus_factor(bonus)))
		.saturating_add(U256::from(PPB / 2));
	scaled / U256::from(PPB)
}

/// `ceil(estimate × (1 + bonus))`.
pub fn estimate_with_bonus(estimate: u64, bonus: f64) -> u64 {
	let scaled = estimate as u128 * bonus_factor(bonus) as u128;
	u64::try_from(scaled.div_ceil(PPB as u128)).unwrap_or(u64::MAX)
}

/// Prices transactions against the node's current fee market.
pub struct GasPricer {
	rpc: Arc<RpcClient>,
	config: GasConfig,
	schedule: HardforkSchedule,
}

impl GasPricer {
	pub fn new(rpc: Arc<RpcClient>, config: GasConfig, schedule: HardforkSchedule) -> Self {
		Self {
			rpc,
			config,
			schedule,
		}
	}

	pub fn config(&self) -> &GasConfig {
		&self.config
	}

	/// Rules in force on `chain_id` at `block`.
	pub fn rules_for(&self, chain_id: u64, block: u64) -> RuleSet {
		self.schedule.rules_for(chain_id, block)
	}

	/// Rules for a transaction landing in the next block of the connected
	/// chain.
	pub async fn active_rules(&self) -> Result<RuleSet, PricingError> {
		let chain_id = self.rpc.chain_id().await?;
		let head = self.rpc.block_number().await?;
		Ok(self.rules_for(chain_id, head.saturating_add(1)))
	}

	fn clamp_price(&self, price: U256) -> U256 {
		let price = match self.config.min_gas_price {
			Some(min) => price.max(U256::from(min)),
			None => price,
		};
		match self.config.max_gas_price {
			Some(max) => price.min(U256::from(max)),
			None => price,
		}
	}

	/// Node gas price with the price bonus applied, within the configured bounds.
	pub async fn legacy_gas_price(&self) -> Result<U256, PricingError> {
		let price = self.rpc.gas_price().await?;
		Ok(self.clamp_price(apply_bonus(price, self.config.gas_price_bonus)))
	}

	async fn pending_base_fee(&self) -> Result<Option<U256>, PricingError> {
		let pending = self
			.rpc
			.block(BlockRef::Directive(BlockDirective::PENDING), false)
			.await?
			.ok_or(PricingError::MissingPendingBlock)?;
		Ok(pending.base_fee_per_gas)
	}

	async fn priority_fee(&self) -> Result<U256, PricingError> {
		let suggested = self.rpc.max_priority_fee_per_gas().await?;
		Ok(apply_bonus(suggested, self.config.gas_price_bonus))
	}

	/// `base_fee × (1 + bonus) + priority`, capped at the maximum gas price.
	fn max_fee(&self, base_fee: U256, priority: U256) -> U256 {
		let max_fee = apply_bonus(base_fee, self.config.gas_price_bonus).saturating_add(priority);
		match self.config.max_gas_price {
			Some(max) => max_fee.min(U256::from(max)),
			None => max_fee,
		}
	}

	/// Fee-market fields from the pending block's base fee and the node's
	/// suggested priority fee. Falls back to a legacy price on chains whose
	/// blocks carry no base fee.
	pub async fn fee_market_fees(&self) -> Result<FeeFields, PricingError> {
		let Some(base_fee) = self.pending_base_fee().await? else {
			tracing::debug!("Pending block has no base fee, using legacy pricing");
			return Ok(FeeFields::Legacy {
				gas_price: self.legacy_gas_price().await?,
			});
		};

		let priority = self.priority_fee().await?;
		let max_fee = self.max_fee(base_fee, priority);
		Ok(FeeFields::FeeMarket {
			max_fee_per_gas: max_fee,
			max_priority_fee_per_gas: priority.min(max_fee),
		})
	}

	/// Fills in whichever fee-market field is missing. Supplied values are
	/// kept as they are.
	///
	/// A derived priority fee never exceeds a supplied maximum fee, and a
	/// derived maximum fee never falls below a supplied priority fee. Without
	/// a base fee the maximum fee is the legacy gas price.
	pub async fn complete_fee_market(
		&self,
		max_fee_per_gas: Option<U256>,
		max_priority_fee_per_gas: Option<U256>,
	) -> Result<FeeFields, PricingError> {
		let (max_fee, priority) = match (max_fee_per_gas, max_priority_fee_per_gas) {
			(Some(max_fee), Some(priority)) => (max_fee, priority),
			(Some(max_fee), None) => (max_fee, self.priority_fee().await?.min(max_fee)),
			(None, priority) => {
				let priority = match priority {
					Some(priority) => priority,
					None => self.priority_fee().await?,
				};
				let max_fee = match self.pending_base_fee().await? {
					Some(base_fee) => self.max_fee(base_fee, priority),
					None => self.legacy_gas_price().await?,
				};
				(max_fee.max(priority), priority)
			},
		};
		Ok(FeeFields::FeeMarket {
			max_fee_per_gas: max_fee,
			max_priority_fee_per_gas: priority,
		})
	}

	/// Fee fields matching `rules`.
	pub async fn fees_for(&self, rules: RuleSet) -> Result<FeeFields, PricingError> {
		if rules.uses_fee_market() {
			self.fee_market_fees().await
		} else {
			Ok(FeeFields::Legacy {
				gas_price: self.legacy_gas_price().await?,
			})
		}
	}

	/// Gas limit for `tx`: the node's estimate with the gas bonus applied,
	/// rounded up.
	///
	/// The caller's `gas` is ignored. If the node rejects the open-ended
	/// estimate, it is retried once bounded by the pending block's gas
	/// limit. Reverts are not retried.
	pub async fn estimate_gas_limit(&self, tx: &TransactionRequest) -> Result<u64, PricingError> {
		let mut request = tx.clone();
		request.gas = None;

		let estimate = match self.rpc.estimate_gas(&request, None).await {
			Ok(estimate) => estimate,
			Err(e @ RpcError::Remote { .. }) if e.revert_data().is_none() => {
				let pending = self
					.rpc
					.block(BlockRef::Directive(BlockDirective::PENDING), false)
					.await?
					.ok_or(PricingError::MissingPendingBlock)?;
				tracing::debug!(
					error = %e,
					gas_limit = pending.gas_limit,
					"Retrying gas estimate bounded by the pending block gas limit"
				);
				request.gas = Some(pending.gas_limit);
				self.rpc.estimate_gas(&request, None).await?
			},
			Err(e) => return Err(e.into()),
		};

		Ok(estimate_with_bonus(estimate, self.config.gas_bonus))
	}
}
