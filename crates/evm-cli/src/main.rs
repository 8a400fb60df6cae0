//! Command-line client for Ethereum-compatible nodes.
//!
//! Queries chain state, resolves names, and sends transactions through
//! `evm-core`. Every command prints its result as JSON on stdout; logs go
//! to stderr.

use clap::Parser;
use evm_config::Config;
use evm_core::ClientBuilder;
use std::path::PathBuf;

mod commands;

use commands::Command;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "evm", author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Node URL; overrides the configured transport URL
	#[arg(long, env = "EVM_RPC_URL")]
	rpc_url: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

/// Loads the config file if one was given, then applies command-line
/// overrides.
async fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
	let mut config = match &args.config {
		Some(path) => {
			let path = path.to_str().ok_or("config path is not valid UTF-8")?;
			Config::from_file(path).await?
		},
		None => Config::default(),
	};
	if let Some(url) = &args.rpc_url {
		config.transport.url = url.clone();
	}
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = load_config(&args).await?;
	tracing::debug!(url = %config.transport.url, "Loaded configuration");

	let client = ClientBuilder::new(config).build()?;
	let output = commands::run(&client, args.command).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}
