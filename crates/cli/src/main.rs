//! Delicious CLI - Database migrations, seeding and reporting.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! dl-cli migrate
//!
//! # Load users, stores and reviews from a YAML file
//! dl-cli seed data/sample.yaml
//!
//! # Print the top stores and tag counts
//! dl-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dl-cli")]
#[command(author, version, about = "Delicious CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Print the top stores and tag counts
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::from_file(&file).await?,
        Commands::Stats => commands::stats::print().await?,
    }
    Ok(())
}
