pub mod catalog;
pub mod presets;
pub mod schedule;
pub mod serve;
pub mod themes;

use anyhow::Result;

use cssloader::client::DaemonClient;
use cssloader::config::Config;

/// Client for the daemon at `server`, or at the configured local port.
pub async fn daemon_client(config_path: &str, server: Option<&str>) -> Result<DaemonClient> {
    let url = match server {
        Some(url) => url.to_string(),
        None => {
            let config = Config::load(config_path).await?;
            format!("http://127.0.0.1:{}", config.server.port)
        }
    };
    Ok(DaemonClient::new(&url))
}
