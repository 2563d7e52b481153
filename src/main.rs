mod client;
mod config;
mod error;
mod ledger;
mod prompt;
mod sweep;
mod tx;
mod wallet;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::ws::WsLedgerClient;
use crate::config::Config;
use crate::prompt::{ConfirmationGate, CredentialSource, EnvOrPromptCredentials, TypedPhraseGate};
use crate::sweep::orchestrator::Sweeper;
use crate::wallet::Wallet;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sweeper=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    println!("XRPL Trust Line Removal Tool");
    println!("{}", "=".repeat(50));
    println!("This tool removes trust lines with zero balance from your XRPL account.");
    println!(
        "Each trust line reserves {} XRP. Removing them releases the reserve.",
        config.reserve_per_object
    );
    println!();

    let credentials = EnvOrPromptCredentials::new(
        "XRPL_SEED",
        "Enter your XRPL account seed (starts with 's'): ",
    );
    let seed = credentials.seed()?;

    // reject malformed credentials before any connection is opened
    if !seed.starts_with('s') {
        eprintln!("Error: Invalid seed format. Seed must start with 's'");
        std::process::exit(1);
    }
    let wallet = match Wallet::from_seed(&seed) {
        Ok(wallet) => wallet,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\nWARNING: This will remove ALL trust lines with zero balance.");
    let gate = TypedPhraseGate::new("Type 'REMOVE ALL' to confirm: ", "REMOVE ALL");
    if !gate.confirm()? {
        println!("Operation cancelled");
        return Ok(());
    }

    let client = WsLedgerClient::connect(&config.websocket_url).await?;
    let sweeper = Sweeper::new(&client, &wallet, &config);
    let outcome = sweeper.run().await;
    // the connection is released on every exit path, aborts included
    client.close().await;
    outcome?;

    // per-item failures are in the report; only total process health is
    // signaled through the exit status
    Ok(())
}
