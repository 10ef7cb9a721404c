//! Print the persisted cart.

use anyhow::Result;

use crate::context::Context;

/// Run the show command.
pub async fn run(ctx: &Context) -> Result<bool> {
    let store = ctx.open_store()?;
    let cart = store.cart();

    ctx.output.header("Cart");
    ctx.output.cart(&cart);

    Ok(true)
}
