//! HTTP client for a running cssloader daemon.
//!
//! Used by CLI commands to talk to `cssloader serve`.

mod error;

pub use crate::api::{
    ApplyPresetRequest, CreatePresetRequest, InstallThemeRequest, InstallThemeResponse,
    ListPresetsResponse, ListScheduleResponse, ListThemesResponse, PresetSummary,
    ReloadThemesResponse, ScheduleEntry, ScheduleRequest, SetThemeRequest,
};
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::Deserialize;

use crate::handlers::ProblemDetails;
use crate::theme::Theme;

/// Response from the /readyz health check endpoint.
#[derive(Debug, Deserialize)]
pub struct ReadyzResponse {
    pub status: String,
    #[serde(default)]
    pub themes: usize,
    #[serde(default)]
    pub scheduler: bool,
}

/// HTTP client for the daemon API.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    base_url: String,
    http: Client,
}

impl DaemonClient {
    /// Create a new client pointing to the given base URL.
    ///
    /// Example: `DaemonClient::new("http://127.0.0.1:8321")`
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Calls GET /readyz.
    pub async fn health(&self) -> Result<ReadyzResponse> {
        let url = format!("{}/readyz", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::ServerUnhealthy {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------------
    // Schedule
    // ------------------------------------------------------------------------

    pub async fn list_schedule(&self) -> Result<Vec<ScheduleEntry>> {
        let url = format!("{}/api/v1/schedule", self.base_url);
        let response = self.http.get(&url).send().await?;
        let body: ListScheduleResponse = self.json_response(response).await?;
        Ok(body.entries)
    }

    /// Create a new scheduled change, or replace `id` if given.
    pub async fn set_schedule(
        &self,
        id: Option<&str>,
        profile_id: &str,
        hours: u8,
        minutes: u8,
    ) -> Result<ScheduleEntry> {
        let body = ScheduleRequest {
            profile_id: profile_id.to_string(),
            hours,
            minutes,
        };
        let request = match id {
            Some(id) => self
                .http
                .put(format!("{}/api/v1/schedule/{}", self.base_url, id)),
            None => self.http.post(format!("{}/api/v1/schedule", self.base_url)),
        };

        let response = request.json(&body).send().await?;
        self.json_response(response).await
    }

    pub async fn remove_schedule(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/v1/schedule/{}", self.base_url, id);
        let response = self.http.delete(&url).send().await?;
        self.empty_response(response).await
    }

    // ------------------------------------------------------------------------
    // Presets & Themes
    // ------------------------------------------------------------------------

    pub async fn list_presets(&self) -> Result<ListPresetsResponse> {
        let url = format!("{}/api/v1/presets", self.base_url);
        let response = self.http.get(&url).send().await?;
        self.json_response(response).await
    }

    /// Activate a preset by name; `None` clears the active preset.
    pub async fn apply_preset(&self, name: &str) -> Result<ListPresetsResponse> {
        let url = format!("{}/api/v1/presets/apply", self.base_url);
        let body = ApplyPresetRequest {
            name: name.to_string(),
        };
        let response = self.http.post(&url).json(&body).send().await?;
        self.json_response(response).await
    }

    /// Save the enabled themes as a new preset; the daemon activates it.
    pub async fn create_preset(&self, name: &str) -> Result<PresetSummary> {
        let url = format!("{}/api/v1/presets", self.base_url);
        let body = CreatePresetRequest {
            name: name.to_string(),
        };
        let response = self.http.post(&url).json(&body).send().await?;
        self.json_response(response).await
    }

    pub async fn list_themes(&self) -> Result<Vec<Theme>> {
        let url = format!("{}/api/v1/themes", self.base_url);
        let response = self.http.get(&url).send().await?;
        let body: ListThemesResponse = self.json_response(response).await?;
        Ok(body.themes)
    }

    pub async fn reload_themes(&self) -> Result<usize> {
        let url = format!("{}/api/v1/themes/reload", self.base_url);
        let response = self.http.post(&url).send().await?;
        let body: ReloadThemesResponse = self.json_response(response).await?;
        Ok(body.themes)
    }

    pub async fn set_theme(&self, name: &str, enabled: bool) -> Result<Theme> {
        let url = format!("{}/api/v1/themes/{}", self.base_url, name);
        let response = self
            .http
            .put(&url)
            .json(&SetThemeRequest { enabled })
            .send()
            .await?;
        self.json_response(response).await
    }

    pub async fn delete_theme(&self, name: &str) -> Result<()> {
        let url = format!("{}/api/v1/themes/{}", self.base_url, name);
        let response = self.http.delete(&url).send().await?;
        self.empty_response(response).await
    }

    /// Install a catalog theme by id. Returns every theme installed,
    /// dependencies included.
    pub async fn install_theme(&self, id: &str) -> Result<Vec<Theme>> {
        let url = format!("{}/api/v1/themes/install", self.base_url);
        let body = InstallThemeRequest { id: id.to_string() };
        let response = self.http.post(&url).json(&body).send().await?;
        let body: InstallThemeResponse = self.json_response(response).await?;
        Ok(body.installed)
    }

    // ------------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------------

    /// Calls POST /api/admin/v1/shutdown.
    pub async fn shutdown(&self, admin_token: Option<&str>) -> Result<()> {
        let url = format!("{}/api/admin/v1/shutdown", self.base_url);
        let mut request = self.http.post(&url);
        if let Some(token) = admin_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        self.empty_response(response).await
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Parse an error response into a ClientError.
    async fn parse_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();

        match response.json::<ProblemDetails>().await {
            Ok(problem) => ClientError::ApiError {
                status,
                message: problem.detail.unwrap_or(problem.title),
            },
            Err(_) => ClientError::ApiError {
                status,
                message: format!("HTTP {status}"),
            },
        }
    }

    /// Parse a successful JSON response or convert error response.
    async fn json_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.parse_error(response).await)
        }
    }

    async fn empty_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.parse_error(response).await)
        }
    }
}
