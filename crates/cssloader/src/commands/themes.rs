//! `cssloader themes` commands.

use anyhow::{Context, Result};

use super::daemon_client;

pub async fn list(config_path: &str, server: Option<&str>) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let themes = client.list_themes().await.context("Failed to list themes")?;

    for theme in themes {
        let marker = if theme.enabled { "*" } else { " " };
        let kind = if theme.is_preset() { " [preset]" } else { "" };
        println!("{marker} {} {}{kind}", theme.display_name, theme.version);
    }
    Ok(())
}

pub async fn set(config_path: &str, server: Option<&str>, name: &str, enabled: bool) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let theme = client
        .set_theme(name, enabled)
        .await
        .with_context(|| format!("Failed to update theme '{name}'"))?;
    let state = if theme.enabled { "enabled" } else { "disabled" };
    println!("{} {state}", theme.display_name);
    Ok(())
}

pub async fn reload(config_path: &str, server: Option<&str>) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let count = client.reload_themes().await.context("Failed to reload themes")?;
    println!("Reloaded {count} themes");
    Ok(())
}

pub async fn install(config_path: &str, server: Option<&str>, id: &str) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let installed = client
        .install_theme(id)
        .await
        .with_context(|| format!("Failed to install theme '{id}'"))?;
    for theme in installed {
        println!("Installed {} {}", theme.display_name, theme.version);
    }
    Ok(())
}

pub async fn uninstall(config_path: &str, server: Option<&str>, name: &str) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    client
        .delete_theme(name)
        .await
        .with_context(|| format!("Failed to uninstall theme '{name}'"))?;
    println!("Uninstalled {name}");
    Ok(())
}
