//! Pending command handler

use anyhow::Result;

use super::App;
use crate::output::Output;

/// Check connectivity, fetch and print the moderation queue
///
/// A failed fetch is reported but not retried; the queue renders as
/// still loading.
pub async fn list(app: &App, output: &Output) -> Result<()> {
    let connected = app.sync_once().await;
    let snapshot = app.controller.snapshot();

    if connected && snapshot.products.is_none() {
        output.warning("Could not fetch pending products");
    }

    output.print_snapshot(&snapshot, &app.config.web_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{app, product, StubGateway};
    use crate::output::OutputFormat;
    use penssum_core::View;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_failed_fetch_is_reported_once() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = Arc::new(StubGateway::default());
        gateway.fail_fetch.store(true, Ordering::SeqCst);
        let app = app(&temp_dir, gateway.clone(), true);

        list(&app, &Output::new(OutputFormat::Quiet)).await.unwrap();

        assert_eq!(gateway.fetches(), 1);
        assert_eq!(app.controller.snapshot().view(), View::Loading);
    }

    #[tokio::test]
    async fn test_lists_fetched_products() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = Arc::new(StubGateway::default());
        *gateway.pending.lock().unwrap() = vec![product("p1")];
        let app = app(&temp_dir, gateway.clone(), true);

        list(&app, &Output::new(OutputFormat::Quiet)).await.unwrap();

        assert_eq!(gateway.fetches(), 1);
        assert_eq!(app.controller.products(), Some(vec![product("p1")]));
    }

    #[tokio::test]
    async fn test_offline_does_not_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = Arc::new(StubGateway::default());
        let app = app(&temp_dir, gateway.clone(), false);

        list(&app, &Output::new(OutputFormat::Quiet)).await.unwrap();

        assert_eq!(gateway.fetches(), 0);
        assert_eq!(app.controller.snapshot().view(), View::Offline);
        assert!(!app.monitor.is_polling());
    }
}
