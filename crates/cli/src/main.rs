//! Copper Kettle CLI - database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! ck-cli migrate
//!
//! # Load demo products and discounts
//! ck-cli seed crates/cli/seed/demo.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ck-cli")]
#[command(author, version, about = "Copper Kettle CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Load products and discounts from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(default_value = "crates/cli/seed/demo.yaml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Seed { file } => commands::seed::from_file(&file).await?,
    }
    Ok(())
}
