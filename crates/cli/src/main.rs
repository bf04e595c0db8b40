//! RocketShoes CLI - Drive the shopping cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (JSON on stdout)
//! rs-cart list
//!
//! # Add one unit of product 3
//! rs-cart add 3
//!
//! # Set product 3 to 4 units, if stock allows
//! rs-cart update 3 4
//!
//! # Remove product 3
//! rs-cart remove 3
//! ```
//!
//! # Commands
//!
//! - `list` - Print cart items, size and total
//! - `add` - Add a product (or one more unit of it)
//! - `remove` - Remove a product
//! - `update` - Set a product's quantity
//!
//! Configuration comes from `ROCKETSHOES_*` environment variables (or `.env`);
//! see `rocketshoes_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    List,
    /// Add a product to the cart
    Add {
        /// Catalog product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Catalog product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Catalog product ID
        product_id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        amount: i32,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::cart::open_store().await?;

    match cli.command {
        Commands::List => commands::cart::list(&store)?,
        Commands::Add { product_id } => commands::cart::add(&store, product_id).await?,
        Commands::Remove { product_id } => commands::cart::remove(&store, product_id).await?,
        Commands::Update { product_id, amount } => {
            commands::cart::update(&store, product_id, amount).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_with_negative_amount() {
        let cli = Cli::try_parse_from(["rs-cart", "update", "2", "-1"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Update { amount: -1, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["rs-cart", "add", "tenis"]).is_err());
    }
}
