//! Status command handler

use anyhow::Result;

use super::App;
use crate::output::{Output, OutputFormat};

/// Show connectivity, service URLs and push registration state
pub async fn show(app: &App, output: &Output) -> Result<()> {
    app.monitor.check().await;
    app.monitor.stop_polling();

    let config = &app.config;
    let state = app.monitor.state();
    let token = app.controller.registrar().registered_token()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "connectivity": state,
                    "api_url": config.api_url,
                    "web_url": config.web_url,
                    "poll_interval_ms": config.poll_interval_ms,
                    "push": {
                        "registered": token.is_some(),
                        "token": token.as_ref().map(|t| t.as_str()),
                        "store": config.token_store_path()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", if state.is_connected() { "connected" } else { "disconnected" });
        }
        OutputFormat::Human => {
            println!("Penssum Admin Status");
            println!("====================");
            println!();
            println!("Service:");
            println!(
                "  Status:   {}",
                if state.is_connected() { "reachable" } else { "unreachable" }
            );
            println!("  API:      {}", config.api_url);
            println!("  Web:      {}", config.web_url);
            println!("  Re-check: every {} ms while offline", config.poll_interval_ms);
            println!();
            println!("Push:");
            match &token {
                Some(token) => println!("  Registered: {}", token),
                None => println!("  Registered: no"),
            }
            println!("  Store:      {}", config.token_store_path().display());
        }
    }

    Ok(())
}
