//! Cart mutation commands.

use anyhow::Result;
use turbo_cart::{Cart, CartError, UpdateProductAmount};

use super::{AddArgs, RemoveArgs, UpdateArgs};
use crate::context::Context;

/// Add one unit of a product.
pub async fn add(args: AddArgs, ctx: &Context) -> Result<bool> {
    let store = ctx.open_store()?;

    let spinner = ctx.output.spinner(&format!("Checking stock for product {}", args.product_id));
    let result = store.add_product(args.product_id).await;
    spinner.finish_and_clear();

    report(ctx, result, || format!("Added product {}", args.product_id))
}

/// Remove a product from the cart.
pub async fn remove(args: RemoveArgs, ctx: &Context) -> Result<bool> {
    let store = ctx.open_store()?;
    let result = store.remove_product(args.product_id);

    report(ctx, result, || format!("Removed product {}", args.product_id))
}

/// Set the amount of a product already in the cart.
pub async fn update(args: UpdateArgs, ctx: &Context) -> Result<bool> {
    let store = ctx.open_store()?;

    let spinner = ctx.output.spinner(&format!("Checking stock for product {}", args.product_id));
    let result = store
        .update_product_amount(UpdateProductAmount {
            product_id: args.product_id,
            amount: args.amount,
        })
        .await;
    spinner.finish_and_clear();

    match update_summary(&args) {
        Some(summary) => report(ctx, result, || summary),
        None => {
            tracing::debug!(product_id = %args.product_id, amount = args.amount, "update ignored");
            ctx.output.info("Amount must be at least 1; cart unchanged.");
            Ok(true)
        }
    }
}

/// Success line for an update, `None` when the store ignores the amount.
fn update_summary(args: &UpdateArgs) -> Option<String> {
    (args.amount > 0)
        .then(|| format!("Product {} amount set to {}", args.product_id, args.amount))
}

fn report(
    ctx: &Context,
    result: Result<std::sync::Arc<Cart>, CartError>,
    done: impl FnOnce() -> String,
) -> Result<bool> {
    match result {
        Ok(cart) => {
            ctx.output.success(&done());
            ctx.output.cart(&cart);
            Ok(true)
        }
        Err(e) => {
            ctx.output.debug(&format!("{e}"));
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CartConfig;
    use crate::output::Output;
    use turbo_cart::ProductId;

    fn update_args(product_id: u64, amount: i64) -> UpdateArgs {
        UpdateArgs {
            product_id: ProductId::new(product_id),
            amount,
        }
    }

    #[test]
    fn test_update_summary() {
        assert_eq!(
            update_summary(&update_args(2, 3)).as_deref(),
            Some("Product 2 amount set to 3")
        );
        assert_eq!(update_summary(&update_args(2, 0)), None);
        assert_eq!(update_summary(&update_args(2, -4)), None);
    }

    #[tokio::test]
    async fn test_update_non_positive_leaves_cart_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CartConfig::default();
        // Never contacted: non-positive amounts skip the stock lookup.
        config.api.base_url = "http://127.0.0.1:9".to_string();
        config.storage.path = dir.path().join("storage.json");
        let ctx = Context {
            config,
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.path().to_path_buf(),
        };

        assert!(update(update_args(2, 0), &ctx).await.unwrap());
        assert!(ctx.open_store().unwrap().cart().is_empty());
        assert!(!dir.path().join("storage.json").exists());
    }
}
