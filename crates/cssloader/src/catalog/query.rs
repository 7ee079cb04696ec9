//! Catalog theme queries.

use serde::{Deserialize, Serialize};

/// Search options for a catalog theme listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeQuery {
    /// Comma separated target filters, or `All`.
    pub filters: String,
    pub order: String,
    #[serde(default)]
    pub search: String,
    pub page: u32,
    pub per_page: u32,
}

impl Default for ThemeQuery {
    fn default() -> Self {
        Self {
            filters: "All".to_string(),
            order: "Most Downloaded".to_string(),
            search: String::new(),
            page: 1,
            per_page: 50,
        }
    }
}

impl ThemeQuery {
    /// Filter string actually sent to the catalog.
    ///
    /// Desktop searches show desktop themes, preset searches show only
    /// presets, and everything else shows BPM themes minus presets.
    pub fn effective_filters(&self) -> String {
        let all = self.filters == "All";
        let prefix = if self.filters.contains("Desktop") {
            "-Preset"
        } else if self.filters == "Preset" {
            "BPM-CSS"
        } else {
            "BPM-CSS.-Preset"
        };

        if all {
            prefix.to_string()
        } else {
            format!("{prefix}.{}", self.filters)
        }
    }

    /// Query parameters in the order the catalog expects.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("filters", self.effective_filters()),
            ("order", self.order.clone()),
            ("search", self.search.clone()),
            ("page", self.page.to_string()),
            ("perPage", self.per_page.to_string()),
        ]
    }
}

/// One theme as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTheme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub download_count: u64,
}

/// Full catalog entry for one theme, as returned by `/themes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub download: BlobRef,
}

/// Reference to a downloadable blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub id: String,
}

/// Page of catalog themes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeList {
    pub total: u64,
    #[serde(default)]
    pub items: Vec<CatalogTheme>,
}

impl ThemeList {
    /// A listing reporting no results has no items either.
    pub fn normalized(self) -> Self {
        if self.total == 0 {
            Self::default()
        } else {
            self
        }
    }
}
