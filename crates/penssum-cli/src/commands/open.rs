//! Open command handler

use anyhow::{Context, Result};

use penssum_core::models::information_url;
use penssum_core::Config;

use crate::output::{Output, OutputFormat};

/// Open a product's page on the web front-end
pub fn open(config: &Config, id: String, print_only: bool, output: &Output) -> Result<()> {
    let url = information_url(&config.web_url, &id);

    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({"id": id, "url": url})),
        OutputFormat::Quiet => println!("{}", url),
        OutputFormat::Human => {
            if print_only {
                println!("{}", url);
            }
        }
    }

    if print_only {
        return Ok(());
    }

    open::that(&url).with_context(|| format!("Failed to open {}", url))?;
    output.success(&format!("Opened {}", url));
    Ok(())
}
