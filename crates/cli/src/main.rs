//! Atelier CLI - catalog tooling.
//!
//! # Usage
//!
//! ```bash
//! # Validate a catalog file before deploying it
//! atelier catalog check crates/storefront/catalog.json
//!
//! # Report per-size stock, optionally for one product
//! atelier catalog stock crates/storefront/catalog.json --product 3
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog file
    Check {
        /// Path to the catalog JSON file
        path: PathBuf,
    },
    /// Report stock per size
    Stock {
        /// Path to the catalog JSON file
        path: PathBuf,

        /// Only report this product id
        #[arg(short, long)]
        product: Option<i32>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Check { path } => commands::catalog::check(&path).await?,
            CatalogAction::Stock { path, product } => {
                commands::catalog::stock(&path, product).await?;
            }
        },
    }
    Ok(())
}
