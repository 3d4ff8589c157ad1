//! Storefront cart CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product
//! cart-cli add --id sku-1 --name "Pineapple Soap" --price 12.50 --quantity 2
//!
//! # Remove a product line
//! cart-cli remove sku-1
//!
//! # Replace the cart with the lines in a JSON file
//! cart-cli sync cart.json
//!
//! # Print the cart and its totals
//! cart-cli show
//!
//! # Empty the cart
//! cart-cli clear
//! ```
//!
//! Every command hydrates the cart from `CART_STORAGE_DIR` first and waits
//! for pending writes before printing the resulting summary.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use storefront_cart::CartConfig;
use storefront_cart_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::{AddArgs, CliError};

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        id: ProductId,

        /// Product display name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Units to add
        #[arg(short, long, default_value = "1")]
        quantity: NonZeroU32,

        /// Brand name
        #[arg(long, default_value = "")]
        brand: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image: String,

        /// Product description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a product line from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart and delete its stored snapshot
    Clear,
    /// Print the cart and its totals
    Show,
    /// Replace the cart with the lines in a JSON array file
    Sync {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr so stdout carries only the cart summary.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_cart=info,storefront_cart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CartConfig::from_env()?;
    let cart = commands::cart::open(&config);

    match cli.command {
        Commands::Add {
            id,
            name,
            price,
            quantity,
            brand,
            image,
            description,
        } => commands::cart::add(
            &cart,
            AddArgs {
                id,
                name,
                price,
                quantity,
                brand,
                image,
                description,
            },
        )?,
        Commands::Remove { id } => commands::cart::remove(&cart, id),
        Commands::Clear => commands::cart::clear(&cart),
        Commands::Show => {}
        Commands::Sync { file } => commands::cart::sync(&cart, &file)?,
    }

    cart.store().flush().await;

    print_summary(&cart.summary());

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &storefront_cart::CartSummary) {
    print!("{}", commands::cart::render(summary));
}
