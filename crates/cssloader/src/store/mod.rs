//! Storage abstraction layer.
//!
//! Trait interfaces for everything the daemon persists or reads from the
//! theme backend, with file-based implementations in the `file` submodule.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            scheduler / theme bridge / catalog client         │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ uses traits
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │        store/ (ScheduleStore, ThemeStore, SettingsStore)     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ implementations
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │   store/file/ (FileScheduleStore, FileThemeStore, ...)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Naming Conventions
//!
//! - `load` - read the persisted value(s)
//! - `save` - replace the persisted value(s), must be atomic
//! - `list` - enumerate entities
//! - `get` / `set` - single key access

pub mod error;

mod schedule;
mod settings;
mod theme;

pub mod file;

pub use error::{StorageError, StorageResult};
pub use schedule::ScheduleStore;
pub use settings::SettingsStore;
pub use theme::ThemeStore;
