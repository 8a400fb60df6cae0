//! Subcommands and their JSON output.

use alloy_primitives::{Bytes, B256, U256};
use clap::{Args, Subcommand};
use evm_core::{EvmClient, PendingTransaction, Sender, TxOptions};
use evm_types::{format_units, BlockDirective, BlockRef, SecretString};
use serde_json::{json, Value};
use std::error::Error;
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Balance of an address or name, in wei
	Balance {
		target: String,
		#[arg(long, allow_hyphen_values = true)]
		block: Option<BlockDirective>,
	},
	/// Block by hash, number, tag or negative offset from the head
	Block {
		#[arg(default_value = "latest", allow_hyphen_values = true)]
		block: BlockRef,
		/// Include full transaction objects
		#[arg(long)]
		full: bool,
	},
	/// Current head block number
	BlockNumber,
	/// Gas price with the configured bonus applied
	GasPrice,
	/// Resolve a name to an address
	Resolve { name: String },
	/// Execute a call without submitting a transaction
	Call {
		to: String,
		#[command(flatten)]
		tx: TxArgs,
		#[arg(long, allow_hyphen_values = true)]
		block: Option<BlockDirective>,
	},
	/// Node gas estimate for a transaction
	Estimate {
		to: Option<String>,
		#[command(flatten)]
		tx: TxArgs,
	},
	/// Submit a transaction; omit TO to deploy `--data`
	Send {
		to: Option<String>,
		#[command(flatten)]
		tx: TxArgs,
		#[command(flatten)]
		wait: WaitArgs,
	},
	/// Send AMOUNT wei to an address or name
	Transfer {
		to: String,
		amount: U256,
		#[command(flatten)]
		tx: TxArgs,
		#[command(flatten)]
		wait: WaitArgs,
	},
	/// Receipt of a transaction, or null while pending
	Receipt { hash: B256 },
}

#[derive(Args, Debug, Clone, Default)]
pub struct TxArgs {
	/// Sender: address, name, or index into the node's accounts
	#[arg(long, value_parser = parse_sender)]
	pub from: Option<Sender>,
	/// Calldata as hex
	#[arg(long)]
	pub data: Option<Bytes>,
	/// Value in wei
	#[arg(long)]
	pub value: Option<U256>,
	#[arg(long)]
	pub gas: Option<u64>,
	#[arg(long)]
	pub gas_price: Option<U256>,
	#[arg(long)]
	pub nonce: Option<u64>,
	/// Signing key; overrides the configured one
	#[arg(long, env = "EVM_PRIVATE_KEY", hide_env_values = true)]
	pub private_key: Option<String>,
}

impl TxArgs {
	fn options(&self) -> TxOptions {
		TxOptions {
			from: self.from.clone(),
			key: self.private_key.as_deref().map(SecretString::from),
			value: self.value,
			data: self.data.clone(),
			gas: self.gas,
			gas_price: self.gas_price,
			nonce: self.nonce,
			..Default::default()
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
	/// Confirmations to wait for after mining
	#[arg(long, default_value_t = 1)]
	pub confirmations: u64,
	#[arg(long, default_value_t = 120)]
	pub timeout_secs: u64,
	/// Print the hash and exit without waiting
	#[arg(long)]
	pub no_wait: bool,
}

/// Numbers are account indices; anything else is an address or a name.
pub fn parse_sender(value: &str) -> Result<Sender, String> {
	let value = value.trim();
	if value.is_empty() {
		return Err("sender must not be empty".to_string());
	}
	if value.chars().all(|c| c.is_ascii_digit()) {
		return value
			.parse::<usize>()
			.map(Sender::Index)
			.map_err(|e| e.to_string());
	}
	Ok(Sender::Name(value.to_string()))
}

async fn wait(pending: PendingTransaction, args: &WaitArgs) -> Result<Value, Box<dyn Error>> {
	let hash = pending.hash();
	if args.no_wait {
		return Ok(json!({ "hash": hash }));
	}
	tracing::info!(tx_hash = %hash, confirmations = args.confirmations, "Waiting for confirmations");
	let receipt = pending
		.confirmed_within(args.confirmations, Duration::from_secs(args.timeout_secs))
		.await?;
	Ok(json!({ "hash": hash, "receipt": receipt }))
}

/// Runs `command` and returns its JSON result.
pub async fn run(client: &EvmClient, command: Command) -> Result<Value, Box<dyn Error>> {
	let output = match command {
		Command::Balance { target, block } => {
			let balance = client.get_balance(&target, block).await?;
			json!({
				"target": target,
				"wei": balance.to_string(),
				"ether": format_units(balance, 18),
			})
		},
		Command::Block { block, full } => serde_json::to_value(client.get_block(block, full).await?)?,
		Command::BlockNumber => json!(client.get_block_number().await?),
		Command::GasPrice => json!({ "wei": client.get_gas_price().await?.to_string() }),
		Command::Resolve { name } => {
			let address = client.resolve(&name).await?;
			json!({ "name": name, "address": address.to_string() })
		},
		Command::Call { to, tx, block } => {
			let options = TxOptions {
				block,
				..tx.options()
			};
			json!({ "output": client.call(Some(&to), &options).await? })
		},
		Command::Estimate { to, tx } => {
			json!({ "gas": client.estimate_gas(to.as_deref(), &tx.options()).await? })
		},
		Command::Send { to, tx, wait: wait_args } => {
			let pending = client.send(to.as_deref(), &tx.options()).await?;
			wait(pending, &wait_args).await?
		},
		Command::Transfer {
			to,
			amount,
			tx,
			wait: wait_args,
		} => {
			let pending = client.transfer(&to, amount, &tx.options()).await?;
			wait(pending, &wait_args).await?
		},
		Command::Receipt { hash } => serde_json::to_value(client.get_receipt(hash).await?)?,
	};
	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_sender() {
		assert_eq!(parse_sender("2").unwrap(), Sender::Index(2));
		assert_eq!(
			parse_sender("alice.eth").unwrap(),
			Sender::Name("alice.eth".to_string())
		);
		assert_eq!(
			parse_sender("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap(),
			Sender::Name("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string())
		);
		assert!(parse_sender(" ").is_err());
	}

	#[test]
	fn test_tx_options() {
		let args = TxArgs {
			value: Some(U256::from(5u64)),
			private_key: Some("0x01".to_string()),
			..Default::default()
		};
		let options = args.options();
		assert_eq!(options.value, Some(U256::from(5u64)));
		assert_eq!(
			options.key.as_ref().map(|key| key.expose_secret().to_string()),
			Some("0x01".to_string())
		);
		assert!(options.block.is_none());
	}
}
