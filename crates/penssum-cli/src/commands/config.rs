//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use penssum_core::config::{PermissionStatus, Platform};
use penssum_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "data_dir, api_url, web_url, poll_interval_ms, probe_timeout_ms, \
    log_file, notifications.show_alert, notifications.play_sound, notifications.set_badge, \
    push.physical_device, push.platform, push.permission, push.token";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.api_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!("  api_url:           {}", config.api_url);
            println!("  web_url:           {}", config.web_url);
            println!("  poll_interval_ms:  {}", config.poll_interval_ms);
            println!("  probe_timeout_ms:  {}", config.probe_timeout_ms);
            println!(
                "  log_file:          {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("Notifications:");
            println!("  show_alert:        {}", config.notifications.show_alert);
            println!("  play_sound:        {}", config.notifications.play_sound);
            println!("  set_badge:         {}", config.notifications.set_badge);
            println!("Push:");
            println!("  physical_device:   {}", config.push.physical_device);
            println!("  platform:          {:?}", config.push.platform);
            println!("  permission:        {:?}", config.push.permission);
            println!(
                "  token:             {}",
                config.push.token.as_deref().unwrap_or("(not set)")
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "api_url" => config.api_url = non_empty(key, value)?,
        "web_url" => config.web_url = non_empty(key, value)?,
        "poll_interval_ms" => config.poll_interval_ms = parse_millis(key, value)?,
        "probe_timeout_ms" => config.probe_timeout_ms = parse_millis(key, value)?,
        "log_file" => config.log_file = optional(value).map(Into::into),
        "notifications.show_alert" => config.notifications.show_alert = parse_bool(key, value)?,
        "notifications.play_sound" => config.notifications.play_sound = parse_bool(key, value)?,
        "notifications.set_badge" => config.notifications.set_badge = parse_bool(key, value)?,
        "push.physical_device" => config.push.physical_device = parse_bool(key, value)?,
        "push.platform" => {
            config.push.platform = match value {
                "android" => Platform::Android,
                "ios" => Platform::Ios,
                "other" => Platform::Other,
                _ => bail!("Invalid value for push.platform. Use 'android', 'ios' or 'other'."),
            };
        }
        "push.permission" => {
            config.push.permission = match value {
                "granted" => PermissionStatus::Granted,
                "denied" => PermissionStatus::Denied,
                "undetermined" => PermissionStatus::Undetermined,
                _ => bail!(
                    "Invalid value for push.permission. Use 'granted', 'denied' or 'undetermined'."
                ),
            };
        }
        "push.token" => config.push.token = optional(value),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears the value
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        bail!("{} cannot be empty", key);
    }
    Ok(value.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid value for {}. Use 'true' or 'false'.", key))
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    let ms: u64 = value
        .parse()
        .with_context(|| format!("Invalid value for {}. Use a number of milliseconds.", key))?;
    if ms == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> Config {
        Config::load_from_str("").unwrap()
    }

    #[test]
    fn test_set_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        let data_dir = temp_dir.path().join("data");
        std::fs::write(&path, format!("data_dir = {:?}\n", data_dir.display().to_string()))
            .unwrap();

        set(
            "push.platform".to_string(),
            "android".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("platform = \"android\""));

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.push.platform, Platform::Android);
        assert_eq!(reloaded.data_dir, data_dir);
    }

    #[test]
    fn test_apply_values() {
        let mut config = config();
        apply(&mut config, "poll_interval_ms", "2500").unwrap();
        apply(&mut config, "notifications.play_sound", "false").unwrap();
        apply(&mut config, "push.permission", "granted").unwrap();
        apply(&mut config, "push.token", "ExponentPushToken[x]").unwrap();

        assert_eq!(config.poll_interval_ms, 2500);
        assert!(!config.notifications.play_sound);
        assert_eq!(config.push.permission, PermissionStatus::Granted);
        assert_eq!(config.push.token.as_deref(), Some("ExponentPushToken[x]"));

        apply(&mut config, "push.token", "none").unwrap();
        assert!(config.push.token.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = config();
        assert!(apply(&mut config, "poll_interval_ms", "0").is_err());
        assert!(apply(&mut config, "poll_interval_ms", "soon").is_err());
        assert!(apply(&mut config, "push.platform", "windows").is_err());
        assert!(apply(&mut config, "api_url", "").is_err());
        assert!(apply(&mut config, "sync_url", "x").is_err());
    }
}
