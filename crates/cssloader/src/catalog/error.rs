//! Catalog client error types.

use thiserror::Error;

use crate::store::StorageError;
use crate::theme::ThemeError;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur when talking to the theme catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Short token has the wrong length. No request was made.
    #[error("invalid token: must be {expected} characters long, got {actual}")]
    InvalidToken { expected: usize, actual: usize },

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog answered with a status outside 200..=300.
    #[error("catalog returned status {status}")]
    BadStatus { status: u16 },

    /// Catalog answered with an empty body where JSON was expected.
    #[error("catalog returned an empty response")]
    EmptyBody,

    /// Response body was not the expected JSON.
    #[error("invalid catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Authentication response carried no token.
    #[error("catalog did not return a token")]
    MissingToken,

    /// Operation needs a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    /// Catalog URL could not be parsed.
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),

    /// A theme depends on something the catalog does not have.
    #[error("dependency '{dependency}' of '{theme}' not found in catalog")]
    DependencyNotFound { theme: String, dependency: String },

    /// Installing a downloaded archive failed.
    #[error(transparent)]
    Theme(#[from] ThemeError),

    /// Settings store failed.
    #[error("settings error: {0}")]
    Storage(#[from] StorageError),
}
