//! Cart CLI - drive the storefront cart from the terminal.
//!
//! Commands:
//! - `cart show` - Print the cart
//! - `cart add <id>` - Add one unit of a product
//! - `cart remove <id>` - Remove a product
//! - `cart update <id> <amount>` - Set a product's amount
//! - `cart config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{AddArgs, ConfigArgs, RemoveArgs, UpdateArgs};
use context::Overrides;

/// Cart CLI - add, remove and update products in the storefront cart
#[derive(Parser)]
#[command(name = "cart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog API base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Storage file (overrides config)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,

    /// Add one unit of a product
    Add(AddArgs),

    /// Remove a product from the cart
    Remove(RemoveArgs),

    /// Set the amount of a product already in the cart
    Update(UpdateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);
    let overrides = Overrides {
        api_url: cli.api_url,
        storage: cli.storage,
    };
    let ctx = context::Context::load(cli.config.as_deref(), overrides, output)?;

    let result = match cli.command {
        Commands::Show => commands::show::run(&ctx).await,
        Commands::Add(args) => commands::cart::add(args, &ctx).await,
        Commands::Remove(args) => commands::cart::remove(args, &ctx).await,
        Commands::Update(args) => commands::cart::update(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await.map(|()| true),
    };

    match result {
        Ok(true) => Ok(()),
        // A notice has already been shown.
        Ok(false) => std::process::exit(1),
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
