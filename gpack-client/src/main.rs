//! gpack command-line client.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gpack_client::{CosignerApi, Finalized, Finalizer, LocalWallet, WalletSigner};
use gpack_core::AccountAddress;
use gpack_node::NodeClient;

#[derive(Parser)]
#[command(name = "gpack", about = "Buy and open Galactic Packs from the command line")]
struct Cli {
    /// Co-signer service base URL.
    #[arg(long, env = "GPACK_SERVICE_URL", default_value = "http://localhost:8080")]
    service_url: String,

    /// Fullnode base URL, used to submit and settle.
    #[arg(
        long,
        env = "GPACK_NODE_URL",
        default_value = "https://fullnode.testnet.aptoslabs.com"
    )]
    node_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Buy one pack.
    Purchase,
    /// Open a previously bought pack.
    Redeem {
        /// Token address of the pack to open.
        pack_token: String,
    },
    /// Show how many packs have been sold.
    TotalSold,
    /// List an account's packs and collectibles.
    Assets {
        /// Account to list; defaults to the configured wallet.
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gpack_client=info,gpack_node=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let api = CosignerApi::new(&cli.service_url)?;

    match cli.command {
        Command::Purchase => {
            let wallet = wallet_from_env()?;
            let envelope = api.purchase(wallet.address()).await?;
            let outcome = finalizer(&cli.node_url, wallet)?.finalize(&envelope).await?;
            report(&outcome);
        }
        Command::Redeem { pack_token } => {
            let wallet = wallet_from_env()?;
            let pack_token: AccountAddress = pack_token
                .parse()
                .context("pack token is not a valid address")?;
            let envelope = api.redeem(wallet.address(), pack_token).await?;
            let outcome = finalizer(&cli.node_url, wallet)?.finalize(&envelope).await?;
            report(&outcome);
        }
        Command::TotalSold => {
            let sold = api.total_sold().await?;
            println!("{sold} packs sold");
        }
        Command::Assets { address } => {
            let owner: AccountAddress = match address {
                Some(addr) => addr.parse().context("not a valid address")?,
                None => wallet_from_env()?.address(),
            };
            let holdings = api.assets(owner).await?;
            println!("{}", serde_json::to_string_pretty(&holdings)?);
        }
    }

    Ok(())
}

fn wallet_from_env() -> anyhow::Result<LocalWallet> {
    let key = std::env::var("USER_PRIVATE_KEY")
        .context("USER_PRIVATE_KEY must be set for signing commands")?;
    Ok(LocalWallet::from_hex(&key)?)
}

fn finalizer(node_url: &str, wallet: LocalWallet) -> anyhow::Result<Finalizer<NodeClient, LocalWallet>> {
    let node = NodeClient::new(node_url)?;
    Ok(Finalizer::new(node, wallet))
}

fn report(outcome: &Finalized) {
    if outcome.result.success {
        println!("settled: {}", outcome.hash);
    } else {
        println!(
            "settled with on-chain failure: {} ({})",
            outcome.hash, outcome.result.vm_status
        );
    }
}
