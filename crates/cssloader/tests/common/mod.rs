//! Common test utilities.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::Mutex;

use cssloader::catalog::CatalogClient;
use cssloader::scheduler::{
    ManualClock, SchedulerConfig, SchedulerHandle, SchedulerService, TimeOfDay,
};
use cssloader::server::{self, AppState};
use cssloader::store::ThemeStore;
use cssloader::store::file::{FileScheduleStore, FileSettingsStore, FileThemeStore};
use cssloader::theme::{PresetRegistry, ThemeManager};

/// Nothing listens here, so catalog calls fail fast.
pub const UNREACHABLE_CATALOG: &str = "http://127.0.0.1:9";

/// A running test daemon: app state plus handles the tests drive directly.
pub struct TestEnv {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub scheduler: SchedulerHandle,
    pub root: &'static Path,
}

impl TestEnv {
    pub fn app(&self) -> Router {
        server::build_app(self.state.clone(), 300)
    }
}

pub fn write_theme(root: &Path, dir: &str, manifest: &str) {
    let path = root.join("themes").join(dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join("theme.json"), manifest).unwrap();
}

/// Installed themes: one plain theme and two presets.
pub fn write_fixture(root: &Path) {
    write_theme(root, "dark", r#"{"name": "Dark Mode"}"#);
    write_theme(
        root,
        "morning",
        r#"{"name": "Morning", "id": "p-morning", "flags": ["PRESET"]}"#,
    );
    write_theme(
        root,
        "evening",
        r#"{"name": "Evening", "id": "p-evening", "flags": ["PRESET"], "dependencies": {"Dark Mode": {}}}"#,
    );
}

/// Create a test environment with the fixture themes and a manual clock at 07:00.
pub async fn test_env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());

    // Leak the TempDir so it doesn't get cleaned up during the test.
    let tmp = Box::leak(Box::new(tmp));
    let root: &'static Path = tmp.path();

    let themes: Arc<dyn ThemeStore> = Arc::new(FileThemeStore::new(root.join("themes")));
    let registry = PresetRegistry::new();
    registry.refresh(themes.as_ref()).await.unwrap();

    let manager = ThemeManager::new(themes, registry.clone());
    let catalog = CatalogClient::new(
        UNREACHABLE_CATALOG,
        Arc::new(FileSettingsStore::new(root.join("settings.json"))),
    );

    let clock = Arc::new(ManualClock::new(TimeOfDay::new(7, 0).unwrap()));
    let scheduler = SchedulerService::new(SchedulerConfig {
        tick_interval: Duration::from_secs(3600),
        clock: clock.clone(),
        registry: registry.clone(),
        applier: Arc::new(manager.clone()),
        store: Arc::new(FileScheduleStore::new(root.join("schedule.yaml"))),
    })
    .start()
    .await;

    let (shutdown_tx, _shutdown_rx) = server::shutdown_channel();
    let state = AppState {
        themes: manager,
        catalog: Arc::new(catalog),
        scheduler: Some(scheduler.clone()),
        admin_token: None,
        shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    TestEnv {
        state,
        clock,
        scheduler,
        root,
    }
}

/// Create a test app with the fixture themes.
pub async fn test_app() -> Router {
    test_env().await.app()
}
