//! `cssloader catalog` commands.
//!
//! These talk to the remote catalog directly; the daemon is not involved.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cssloader::catalog::{CatalogClient, ThemeQuery};
use cssloader::config::Config;
use cssloader::store::file::FileSettingsStore;

async fn catalog_client(config_path: &str) -> Result<CatalogClient> {
    let config = Config::load(config_path).await?;
    let paths = config.paths(Path::new(config_path));
    let settings = Arc::new(FileSettingsStore::new(paths.settings));
    Ok(CatalogClient::new(&config.catalog.api_url, settings))
}

/// Log in with the stored short token, if there is one.
async fn restore_login(client: &CatalogClient) -> Result<bool> {
    if client.load_short_token().await?.is_none() {
        return Ok(false);
    }
    client.log_in(None).await.context("Stored token rejected")?;
    Ok(true)
}

pub async fn login(config_path: &str, token: &str) -> Result<()> {
    let client = catalog_client(config_path).await?;
    let me = client.log_in(Some(token)).await.context("Login failed")?;
    println!("Logged in as {}", me.username);
    Ok(())
}

pub async fn logout(config_path: &str) -> Result<()> {
    let client = catalog_client(config_path).await?;
    client.log_out().await?;
    println!("Logged out");
    Ok(())
}

pub async fn themes(
    config_path: &str,
    query: ThemeQuery,
    starred: bool,
) -> Result<()> {
    let client = catalog_client(config_path).await?;

    let path = if starred {
        if !restore_login(&client).await? {
            anyhow::bail!("Not logged in; run `cssloader catalog login <TOKEN>` first");
        }
        "/users/me/stars"
    } else {
        "/themes"
    };

    let list = client
        .get_themes(&query, path, starred)
        .await
        .context("Failed to fetch themes")?;

    println!("{} themes (page {})", list.total, query.page);
    for theme in list.items {
        let name = theme.display_name.as_deref().unwrap_or(&theme.name);
        println!("{name}  {}  [{}]  {}", theme.version, theme.target, theme.id);
    }
    Ok(())
}

pub async fn star(config_path: &str, theme_id: &str, unstar: bool) -> Result<()> {
    let client = catalog_client(config_path).await?;
    if !restore_login(&client).await? {
        anyhow::bail!("Not logged in; run `cssloader catalog login <TOKEN>` first");
    }

    client.toggle_star(theme_id, unstar).await?;
    println!("{} {theme_id}", if unstar { "Unstarred" } else { "Starred" });
    Ok(())
}
