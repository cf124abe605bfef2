//! IABS token console binary.
//!
//! Composition root that assembles:
//! 1. Configuration from the environment (and `.env`)
//! 2. File logging
//! 3. Chain transport, wallet and session via `SessionAssembler`
//! 4. The line-oriented console on stdin/stdout
//!
//! # Examples
//!
//! ```bash
//! # Avalanche Fuji through a local signing node
//! IABS_CHAIN=avalanche IABS_WALLET_URL=http://127.0.0.1:8545 cargo run -p iabs-client
//!
//! # Read-only view of the Sui deployment
//! IABS_CHAIN=sui IABS_IDENTITY=0x... cargo run -p iabs-client
//! ```

use anyhow::{Context, Result};
use client_bootstrap::{ClientConfig, SessionAssembler, setup_logging};
use iabs_client::Console;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Load configuration from environment
    let config = ClientConfig::from_env().context("loading configuration")?;

    // 2. Setup logging; the guard flushes the file writer on exit
    let (_log_guard, log_dir) = setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting IABS client");
    tracing::info!(
        chain = %config.contract.chain,
        network = %config.contract.network,
        contract = %config.contract.contract_id,
        "configuration loaded"
    );

    // 3. Build session (transport + wallet per chain)
    let identity = config.identity.clone();
    let setup = SessionAssembler::new(config).build()?;
    tracing::info!("Session built successfully");

    // 4. Build and run console
    let console = Console::builder()
        .session(setup.session)
        .wallet(setup.wallet)
        .identity(identity)
        .build()?;

    println!("logs: {}", log_dir.display());
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    tracing::info!("Client shutdown complete");
    Ok(())
}
