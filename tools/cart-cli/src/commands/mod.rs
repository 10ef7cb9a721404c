//! CLI command implementations.
//!
//! Cart commands return `Ok(false)` when the store rejected the mutation.
//! The notifier has already told the user why, so `main` only sets the exit
//! code.

pub mod cart;
pub mod config;
pub mod show;

use clap::{Args, Subcommand};
use turbo_cart::ProductId;

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Catalog product id.
    pub product_id: ProductId,
}

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Product id to remove.
    pub product_id: ProductId,
}

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// Product id already in the cart.
    pub product_id: ProductId,

    /// New amount. Zero or less is ignored.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,

        /// Use the Brazilian Portuguese notice texts.
        #[arg(long)]
        pt_br: bool,
    },
}
