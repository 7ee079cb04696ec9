//! `cssloader schedule` commands.

use anyhow::{Context, Result};

use super::daemon_client;

pub async fn list(config_path: &str, server: Option<&str>) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    let entries = client
        .list_schedule()
        .await
        .context("Failed to list schedule")?;

    if entries.is_empty() {
        println!("No scheduled changes.");
        return Ok(());
    }

    for entry in entries {
        let target = entry.preset_name.as_deref().unwrap_or("<missing preset>");
        println!("{}  {}  {}", entry.time, target, entry.id);
    }
    Ok(())
}

/// Parse `HH:MM`.
pub fn parse_time(input: &str) -> Result<(u8, u8)> {
    let (hours, minutes) = input
        .split_once(':')
        .with_context(|| format!("expected HH:MM, got '{input}'"))?;
    let hours: u8 = hours
        .trim()
        .parse()
        .with_context(|| format!("invalid hours in '{input}'"))?;
    let minutes: u8 = minutes
        .trim()
        .parse()
        .with_context(|| format!("invalid minutes in '{input}'"))?;
    Ok((hours, minutes))
}

pub async fn set(
    config_path: &str,
    server: Option<&str>,
    id: Option<&str>,
    preset_id: &str,
    time: &str,
) -> Result<()> {
    let (hours, minutes) = parse_time(time)?;
    let client = daemon_client(config_path, server).await?;
    let entry = client
        .set_schedule(id, preset_id, hours, minutes)
        .await
        .context("Failed to schedule preset change")?;

    println!(
        "Scheduled {} at {} ({})",
        entry.preset_name.as_deref().unwrap_or(&entry.profile_id),
        entry.time,
        entry.id
    );
    Ok(())
}

pub async fn remove(config_path: &str, server: Option<&str>, id: &str) -> Result<()> {
    let client = daemon_client(config_path, server).await?;
    client
        .remove_schedule(id)
        .await
        .context("Failed to remove scheduled change")?;
    println!("Removed {id}");
    Ok(())
}
