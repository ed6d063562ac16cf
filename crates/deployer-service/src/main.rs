//! Main entry point for the contract deployer.
//!
//! Deploys the contracts listed in a TOML configuration file, in order, and
//! prints the resulting addresses as JSON.
//!
//! ```bash
//! export DEPLOYER_PRIVATE_KEY="0x..."
//! export TREASURER_ADDRESS="0x..."
//! export PRICE_FEED_ADDRESS="0x..."
//! deployer --config config/chama.toml --output deployments.json
//!
//! # Validate the plan without sending transactions
//! deployer --config config/chama.toml --check
//! ```

use clap::Parser;
use deployer_config::Config;
use deployer_service::{build_deployer, execute, plan_from_config, render_report, write_report};
use std::path::PathBuf;

/// Command-line arguments for the deployer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to the deployment configuration file
	#[arg(short, long, env = "DEPLOYER_CONFIG", default_value = "config/chama.toml")]
	config: PathBuf,

	/// Validate the configuration and plan, then exit without deploying
	#[arg(long, default_value = "false")]
	check: bool,

	/// Also write the deployed addresses as JSON to this file
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the deployer.
///
/// This function:
/// 1. Loads `.env` and parses command-line arguments
/// 2. Initializes logging
/// 3. Loads the configuration and validates the plan
/// 4. Deploys every step in order and reports the addresses
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let _ = dotenvy::dotenv();
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config)?;
	tracing::info!(
		config = %args.config.display(),
		chain_id = config.network.chain_id,
		"Loaded configuration"
	);

	let steps = plan_from_config(&config)?;
	for (index, step) in steps.iter().enumerate() {
		tracing::info!(index, step = %step.name, args = step.args.len(), gas_limit = ?step.options.gas_limit, "Planned");
	}

	if args.check {
		tracing::info!(steps = steps.len(), "Deployment plan is valid");
		return Ok(());
	}

	let deployer = build_deployer(&config)?;
	let result = execute(&config, &steps, deployer).await.map_err(|e| {
		tracing::error!(error = %e, "Deployment run failed");
		e
	})?;

	let report = render_report(&result)?;
	if let Some(output) = &args.output {
		write_report(output, &report)?;
		tracing::info!(path = %output.display(), "Wrote deployment report");
	}
	println!("{}", report);

	Ok(())
}
