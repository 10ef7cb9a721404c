//! Configuration management commands.

use anyhow::Result;
use dialoguer::Confirm;
use turbo_cart::Messages;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CartConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force, pt_br } => init_config(force, pt_br, ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    ctx.output.kv("timeout_secs", &config.api.timeout_secs.to_string());
    if config.api.bearer_token.is_some() {
        ctx.output.kv("bearer_token", "********");
    }

    ctx.output.info("[storage]");
    ctx.output.kv("path", &ctx.storage_path().display().to_string());
    ctx.output.kv("key", &config.storage.key);

    ctx.output.info("[messages]");
    ctx.output.kv("stock_exceeded", &config.messages.stock_exceeded);
    ctx.output.kv("add_failed", &config.messages.add_failed);
    ctx.output.kv("remove_failed", &config.messages.remove_failed);
    ctx.output.kv("update_failed", &config.messages.update_failed);

    Ok(())
}

async fn init_config(force: bool, pt_br: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("cart.toml");

    if config_path.exists() && !force {
        let overwrite = !ctx.output.is_json()
            && Confirm::new()
                .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()?;

        if !overwrite {
            ctx.output.warn("Config init cancelled. Use --force to overwrite.");
            return Ok(());
        }
    }

    if pt_br {
        let config = CartConfig {
            messages: Messages::pt_br(),
            ..CartConfig::default()
        };
        config.save(&config_path)?;
    } else {
        std::fs::write(&config_path, generate_default_config()?)?;
    }

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}
