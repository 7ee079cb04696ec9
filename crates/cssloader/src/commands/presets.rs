//! `cssloader presets` commands.

use anyhow::{Context, Result};

use cssloader::client::ListPresetsResponse;

use super::daemon_client;

pub async fn list(config_path: &str, server: Option<&str>) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let response = client
        .list_presets()
        .await
        .context("Failed to list presets")?;
    print_presets(&response);
    Ok(())
}

pub async fn apply(config_path: &str, server: Option<&str>, name: &str) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let response = client
        .apply_preset(name)
        .await
        .with_context(|| format!("Failed to apply preset '{name}'"))?;
    print_presets(&response);
    Ok(())
}

pub async fn create(config_path: &str, server: Option<&str>, name: &str) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let preset = client
        .create_preset(name)
        .await
        .with_context(|| format!("Failed to create preset '{name}'"))?;
    println!("Created and applied {}  ({})", preset.display_name, preset.id);
    Ok(())
}

fn print_presets(response: &ListPresetsResponse) {
    println!("Selected: {}", response.selected);
    for preset in &response.presets {
        let marker = if preset.enabled { "*" } else { " " };
        println!("{marker} {}  ({})", preset.display_name, preset.id);
    }
}
