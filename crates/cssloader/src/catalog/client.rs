//! HTTP client for the remote theme catalog.

use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::auth::{
    SHORT_TOKEN_KEY, TokenResponse, TokenState, TokenStatus, UserInfo, validate_short_token,
};
use super::error::{CatalogError, Result};
use super::query::{CatalogTheme, ThemeDetails, ThemeList, ThemeQuery};
use crate::store::SettingsStore;

/// Client for the theme catalog API.
///
/// Holds the login state for the lifetime of the process; only the short
/// token is persisted, through the settings store.
pub struct CatalogClient {
    api_url: String,
    http: Client,
    settings: Arc<dyn SettingsStore>,
    state: Mutex<TokenState>,
}

impl CatalogClient {
    pub fn new(api_url: &str, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http: Client::new(),
            settings,
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Load the persisted short token, if any.
    pub async fn load_short_token(&self) -> Result<Option<String>> {
        let stored = self
            .settings
            .get(SHORT_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty());
        if let Some(token) = &stored {
            self.state.lock().await.short_token = token.clone();
        }
        Ok(stored)
    }

    /// The logged-in user, if any.
    pub async fn me(&self) -> Option<UserInfo> {
        self.state.lock().await.me.clone()
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Exchange a short token for a full token and fetch the user.
    ///
    /// With `None`, the short token loaded from settings is used. The short
    /// token is persisted only after the catalog accepts it.
    pub async fn log_in(&self, short_token: Option<&str>) -> Result<UserInfo> {
        let short_token = match short_token {
            Some(t) => t.to_string(),
            None => self.state.lock().await.short_token.clone(),
        };
        validate_short_token(&short_token)?;

        let url = format!("{}/auth/authenticate_token", self.api_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "token": short_token }))
            .send()
            .await?;
        let body: TokenResponse = read_json(response).await?;
        let full_token = body.token.ok_or(CatalogError::MissingToken)?;

        self.settings.set(SHORT_TOKEN_KEY, &short_token).await?;
        {
            let mut state = self.state.lock().await;
            state.short_token = short_token;
            state.issue(full_token.clone(), Utc::now());
        }

        let me: UserInfo = self.get_with_token("/auth/me", Some(&full_token)).await?;
        self.state.lock().await.me = Some(me.clone());

        info!(username = %me.username, "Logged in to theme catalog");
        Ok(me)
    }

    /// Token to use for the next authenticated call.
    ///
    /// Returns `None` when not logged in. An expired token is refreshed
    /// first and the new one starts a fresh lifetime.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        let mut state = self.state.lock().await;

        let expired = match state.status(Utc::now()) {
            TokenStatus::Missing => return Ok(None),
            TokenStatus::Fresh(token) => return Ok(Some(token)),
            TokenStatus::Expired(token) => token,
        };

        let url = format!("{}/auth/refresh_token", self.api_url);
        let response = self.http.post(&url).bearer_auth(&expired).send().await?;
        let body: TokenResponse = read_json(response).await?;
        let token = body.token.ok_or(CatalogError::MissingToken)?;

        state.issue(token.clone(), Utc::now());
        debug!("Refreshed catalog token");
        Ok(Some(token))
    }

    /// Forget all tokens and user data, including the persisted short token.
    pub async fn log_out(&self) -> Result<()> {
        self.state.lock().await.clear();
        self.settings.set(SHORT_TOKEN_KEY, "").await?;
        info!("Logged out of theme catalog");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// GET `path` and parse the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, requires_auth: bool) -> Result<T> {
        if !requires_auth {
            return self.get_with_token(path, None).await;
        }

        let token = self.refresh_token().await?.ok_or(CatalogError::NotLoggedIn)?;
        self.get_with_token(path, Some(&token)).await
    }

    /// List catalog themes under `api_path` (e.g. `/themes` or
    /// `/users/me/stars`).
    pub async fn get_themes(
        &self,
        query: &ThemeQuery,
        api_path: &str,
        requires_auth: bool,
    ) -> Result<ThemeList> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.api_url, api_path))
            .map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query.to_params());

        let path_and_query = match url.query() {
            Some(q) => format!("{api_path}?{q}"),
            None => api_path.to_string(),
        };

        let list: ThemeList = self.get_json(&path_and_query, requires_auth).await?;
        Ok(list.normalized())
    }

    /// Star or unstar a theme for the logged-in user.
    pub async fn toggle_star(&self, theme_id: &str, is_starred: bool) -> Result<()> {
        let token = self.refresh_token().await?.ok_or(CatalogError::NotLoggedIn)?;
        let method = if is_starred {
            Method::DELETE
        } else {
            Method::POST
        };

        let url = format!("{}/users/me/stars/{}", self.api_url, theme_id);
        let response = self
            .http
            .request(method, &url)
            .bearer_auth(&token)
            .send()
            .await?;
        check_status(&response)?;

        debug!(theme_id = %theme_id, starred = !is_starred, "Toggled star");
        Ok(())
    }

    /// Full catalog entry for one theme.
    pub async fn get_theme(&self, theme_id: &str) -> Result<ThemeDetails> {
        self.get_json(&format!("/themes/{theme_id}"), false).await
    }

    /// Search the catalog for a theme with exactly this name.
    pub async fn find_theme_by_name(&self, name: &str) -> Result<Option<CatalogTheme>> {
        let query = ThemeQuery {
            search: name.to_string(),
            ..Default::default()
        };
        let list = self.get_themes(&query, "/themes", false).await?;
        Ok(list.items.into_iter().find(|t| t.name == name))
    }

    /// Download a blob, typically a theme zip archive.
    pub async fn download_blob(&self, blob_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/blobs/{}", self.api_url, blob_id);
        let response = self.http.get(&url).send().await?;
        check_status(&response)?;

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CatalogError::EmptyBody);
        }
        debug!(blob_id = %blob_id, size = bytes.len(), "Downloaded blob");
        Ok(bytes.to_vec())
    }

    async fn get_with_token<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        read_json(response).await.inspect_err(|e| {
            warn!(path = %path, error = %e, "Catalog request failed");
        })
    }
}

/// The catalog treats 200 through 300 inclusive as success.
fn check_status(response: &Response) -> Result<()> {
    let status = response.status().as_u16();
    if (200..=300).contains(&status) {
        Ok(())
    } else {
        Err(CatalogError::BadStatus { status })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    check_status(&response)?;
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Err(CatalogError::EmptyBody);
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::file::FileSettingsStore;
    use axum::extract::{Path, RawQuery, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    const SHORT: &str = "abcdefghijkl";

    #[derive(Default)]
    struct Catalog {
        refreshes: StdMutex<u32>,
        queries: StdMutex<Vec<String>>,
        stars: StdMutex<Vec<(String, String)>>,
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::to_string)
    }

    async fn authenticate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["token"] == SHORT {
            (StatusCode::OK, Json(json!({"token": "full-1"})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad token"})))
        }
    }

    async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        match bearer(&headers).as_deref() {
            Some("full-1") | Some("full-2") => (StatusCode::OK, Json(json!({"username": "deck"}))),
            _ => (StatusCode::UNAUTHORIZED, Json(json!({}))),
        }
    }

    async fn refresh(State(catalog): State<Arc<Catalog>>) -> Json<Value> {
        *catalog.refreshes.lock().unwrap() += 1;
        Json(json!({"token": "full-2"}))
    }

    async fn themes(
        State(catalog): State<Arc<Catalog>>,
        RawQuery(query): RawQuery,
    ) -> Json<Value> {
        catalog
            .queries
            .lock()
            .unwrap()
            .push(query.unwrap_or_default());
        Json(json!({"total": 1, "items": [{"id": "t1", "name": "Dark"}]}))
    }

    async fn star(
        State(catalog): State<Arc<Catalog>>,
        Path(id): Path<String>,
        method: Method,
    ) -> StatusCode {
        catalog
            .stars
            .lock()
            .unwrap()
            .push((method.to_string(), id));
        StatusCode::OK
    }

    async fn spawn_catalog() -> (String, Arc<Catalog>) {
        let catalog = Arc::new(Catalog::default());
        let app = Router::new()
            .route("/auth/authenticate_token", post(authenticate))
            .route("/auth/me", get(me))
            .route("/auth/refresh_token", post(refresh))
            .route("/themes", get(themes))
            .route("/empty", get(|| async { StatusCode::OK }))
            .route("/users/me/stars/{id}", post(star).delete(star))
            .with_state(catalog.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), catalog)
    }

    fn client(url: &str, temp_dir: &TempDir) -> (CatalogClient, Arc<FileSettingsStore>) {
        let settings = Arc::new(FileSettingsStore::new(temp_dir.path().join("settings.json")));
        (CatalogClient::new(url, settings.clone()), settings)
    }

    #[tokio::test]
    async fn log_in_rejects_wrong_length_without_request() {
        let temp_dir = TempDir::new().unwrap();
        // Nothing listens here; a request would fail with Http.
        let (client, _) = client("http://127.0.0.1:9", &temp_dir);

        let err = client.log_in(Some("short")).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidToken { actual: 5, .. }));
    }

    #[tokio::test]
    async fn log_in_stores_short_token_and_user() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, settings) = client(&url, &temp_dir);

        let me = client.log_in(Some(SHORT)).await.unwrap();

        assert_eq!(me.username, "deck");
        assert_eq!(client.me().await.unwrap().username, "deck");
        assert_eq!(
            settings.get(SHORT_TOKEN_KEY).await.unwrap().as_deref(),
            Some(SHORT)
        );
        assert_eq!(client.refresh_token().await.unwrap().as_deref(), Some("full-1"));
    }

    #[tokio::test]
    async fn log_in_with_rejected_token_persists_nothing() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, settings) = client(&url, &temp_dir);

        let err = client.log_in(Some("zzzzzzzzzzzz")).await.unwrap_err();

        assert!(matches!(err, CatalogError::BadStatus { status: 401 }));
        assert_eq!(settings.get(SHORT_TOKEN_KEY).await.unwrap(), None);
        assert!(client.me().await.is_none());
    }

    #[tokio::test]
    async fn log_in_uses_stored_short_token() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, settings) = client(&url, &temp_dir);
        settings.set(SHORT_TOKEN_KEY, SHORT).await.unwrap();

        assert_eq!(client.load_short_token().await.unwrap().as_deref(), Some(SHORT));
        client.log_in(None).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_only_when_expired() {
        let (url, catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, _) = client(&url, &temp_dir);

        assert_eq!(client.refresh_token().await.unwrap(), None);

        client.log_in(Some(SHORT)).await.unwrap();
        client.refresh_token().await.unwrap();
        assert_eq!(*catalog.refreshes.lock().unwrap(), 0);

        client.state.lock().await.expires_at = Some(Utc::now() - chrono::TimeDelta::seconds(1));
        let token = client.refresh_token().await.unwrap();

        assert_eq!(token.as_deref(), Some("full-2"));
        assert_eq!(*catalog.refreshes.lock().unwrap(), 1);
        assert!(client.state.lock().await.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn log_out_clears_state_and_short_token() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, settings) = client(&url, &temp_dir);
        client.log_in(Some(SHORT)).await.unwrap();

        client.log_out().await.unwrap();

        assert!(client.me().await.is_none());
        assert_eq!(client.refresh_token().await.unwrap(), None);
        assert_eq!(settings.get(SHORT_TOKEN_KEY).await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn get_themes_sends_prefixed_filters() {
        let (url, catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, _) = client(&url, &temp_dir);

        let query = ThemeQuery {
            filters: "Keyboard".to_string(),
            order: "Most Downloaded".to_string(),
            search: String::new(),
            page: 1,
            per_page: 50,
        };
        let list = client.get_themes(&query, "/themes", false).await.unwrap();

        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].name, "Dark");
        assert_eq!(
            catalog.queries.lock().unwrap()[0],
            "filters=BPM-CSS.-Preset.Keyboard&order=Most+Downloaded&search=&page=1&perPage=50"
        );
    }

    #[tokio::test]
    async fn authenticated_get_requires_login() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, _) = client(&url, &temp_dir);

        let err = client
            .get_themes(&ThemeQuery::default(), "/themes", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotLoggedIn));
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let (url, _catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, _) = client(&url, &temp_dir);

        let err = client.get_json::<Value>("/empty", false).await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyBody));
    }

    #[tokio::test]
    async fn toggle_star_picks_method() {
        let (url, catalog) = spawn_catalog().await;
        let temp_dir = TempDir::new().unwrap();
        let (client, _) = client(&url, &temp_dir);
        client.log_in(Some(SHORT)).await.unwrap();

        client.toggle_star("t1", false).await.unwrap();
        client.toggle_star("t1", true).await.unwrap();

        assert_eq!(
            *catalog.stars.lock().unwrap(),
            vec![
                ("POST".to_string(), "t1".to_string()),
                ("DELETE".to_string(), "t1".to_string())
            ]
        );
    }
}
