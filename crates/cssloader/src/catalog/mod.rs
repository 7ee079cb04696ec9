//! Remote theme catalog client.
//!
//! Covers short-token login, token refresh, theme listings, stars and
//! installing themes together with their missing dependencies.

pub mod auth;
pub mod client;
pub mod error;
pub mod install;
pub mod query;

pub use auth::{SHORT_TOKEN_KEY, SHORT_TOKEN_LEN, TokenState, TokenStatus, UserInfo};
pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use install::install_theme;
pub use query::{BlobRef, CatalogTheme, ThemeDetails, ThemeList, ThemeQuery};
