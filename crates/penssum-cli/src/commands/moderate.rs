//! Approve/reject command handlers

use anyhow::{Context, Result};

use super::App;
use crate::output::Output;

/// Approve a pending product
pub async fn approve(app: &App, id: String, output: &Output) -> Result<()> {
    prepare(app, &id, output).await;

    let delivery = app
        .controller
        .approve(&id)
        .await
        .with_context(|| format!("Failed to approve {}", id))?;

    output.print_delivery("approved", &id, delivery);
    Ok(())
}

/// Reject a pending product: its files are archived and the owner notified
pub async fn reject(app: &App, id: String, output: &Output) -> Result<()> {
    prepare(app, &id, output).await;

    let delivery = app
        .controller
        .reject(&id)
        .await
        .with_context(|| format!("Failed to reject {}", id))?;

    output.print_delivery("rejected", &id, delivery);
    Ok(())
}

/// Load the list so the action has the product's files at hand
///
/// Offline is not an error here; the action reports `skipped`.
async fn prepare(app: &App, id: &str, output: &Output) {
    if !app.sync_once().await {
        return;
    }
    if app.controller.snapshot().product(id).is_none() {
        output.warning(&format!("{} is not in the pending list", id));
    }
}
