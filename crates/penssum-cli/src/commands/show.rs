//! Show command handler

use anyhow::{bail, Result};

use super::App;
use crate::output::Output;

/// Print one pending product in full
pub async fn show(app: &App, id: String, output: &Output) -> Result<()> {
    if !app.sync_once().await {
        bail!("Offline; cannot look up product {}", id);
    }

    let snapshot = app.controller.snapshot();
    if snapshot.products.is_none() {
        bail!("Could not fetch pending products");
    }
    let Some(product) = snapshot.product(&id) else {
        bail!("Product {} is not awaiting review", id);
    };

    output.print_product(product, &app.config.web_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{app, product, StubGateway};
    use crate::output::OutputFormat;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[tokio::test]
    async fn test_show_pending_product() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = Arc::new(StubGateway::default());
        *gateway.pending.lock().unwrap() = vec![product("p1"), product("p2")];
        let app = app(&temp_dir, gateway, true);

        show(&app, "p2".to_string(), &quiet()).await.unwrap();
    }

    #[tokio::test]
    async fn test_show_unknown_id() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = Arc::new(StubGateway::default());
        *gateway.pending.lock().unwrap() = vec![product("p1")];
        let app = app(&temp_dir, gateway, true);

        let err = show(&app, "p9".to_string(), &quiet()).await.unwrap_err();
        assert!(err.to_string().contains("p9"));
    }

    #[tokio::test]
    async fn test_show_offline_or_failed_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let offline = app(&temp_dir, Arc::new(StubGateway::default()), false);
        assert!(show(&offline, "p1".to_string(), &quiet()).await.is_err());

        let gateway = Arc::new(StubGateway::default());
        gateway.fail_fetch.store(true, Ordering::SeqCst);
        let failing = app(&temp_dir, gateway.clone(), true);
        assert!(show(&failing, "p1".to_string(), &quiet()).await.is_err());
        assert_eq!(gateway.fetches(), 1);
    }
}
