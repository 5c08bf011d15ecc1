//! Register command handler

use anyhow::{Context, Result};

use super::App;
use crate::output::{Output, OutputFormat};

/// Run push registration for this device
pub async fn register(app: &App, output: &Output) -> Result<()> {
    let connected = app.monitor.check().await;
    app.monitor.stop_polling();

    let already = app.controller.registrar().registered_token()?.is_some();
    let token = app
        .controller
        .registrar()
        .register(connected)
        .await
        .context("Push registration failed")?;
    let registered = app.controller.registrar().registered_token()?.is_some();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "token": token.as_ref().map(|t| t.as_str()),
                    "registered": registered,
                    "connected": connected
                })
            );
        }
        OutputFormat::Quiet => match &token {
            Some(token) => println!("{}", token),
            None => println!("skipped"),
        },
        OutputFormat::Human => match &token {
            None => println!("Push registration skipped (not a physical device or permission not granted)"),
            Some(token) if registered && !already => println!("✓ Registered {}", token),
            Some(token) if registered => println!("Already registered: {}", token),
            Some(token) => println!("Offline; {} will be registered on the next connected run", token),
        },
    }

    Ok(())
}
