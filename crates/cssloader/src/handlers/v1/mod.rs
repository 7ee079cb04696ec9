//! V1 API handlers.

mod presets;
mod schedule;
mod themes;

pub use presets::{apply_preset, create_preset, list_presets};
pub use schedule::{create_schedule, delete_schedule, list_schedule, upsert_schedule};
pub use themes::{delete_theme, install_theme, list_themes, reload_themes, set_theme};
