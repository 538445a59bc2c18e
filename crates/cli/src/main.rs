//! RocketShoes CLI - Cart sessions from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! rs-cart show
//!
//! # Add one unit of product 3
//! rs-cart add 3
//!
//! # Set product 3 to two units
//! rs-cart update 3 2
//!
//! # Remove product 3
//! rs-cart remove 3
//!
//! # Structured logs for a log collector
//! rs-cart --log-json show
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart with subtotals and total
//! - `add` - Add one unit of a product (stock-checked)
//! - `remove` - Remove a product
//! - `update` - Set a product's quantity (stock-checked)
//!
//! Every invocation is one session: the cart is hydrated from the storage
//! directory, the command runs, notices are printed, and the resulting cart
//! is shown.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Store API base URL (overrides `ROCKETSHOES_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Storage directory (overrides `ROCKETSHOES_STORAGE_DIR`)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Print the cart as the raw JSON snapshot
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs on stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity (zero or negative is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes_cli=info".into());

    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let session = commands::cart::Session::open(cli.api_url.as_deref(), cli.storage_dir)?;

    let action = match cli.command {
        Commands::Show => commands::cart::Action::Show,
        Commands::Add { product_id } => commands::cart::Action::Add(product_id),
        Commands::Remove { product_id } => commands::cart::Action::Remove(product_id),
        Commands::Update { product_id, amount } => {
            commands::cart::Action::Update(product_id, amount)
        }
    };

    session.run(action, cli.json).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_json_is_global() {
        let cli = Cli::try_parse_from(["rs-cart", "update", "3", "2", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Update { amount: 2, .. }));

        let cli = Cli::try_parse_from(["rs-cart", "show"]).unwrap();
        assert!(!cli.log_json);
    }
}
