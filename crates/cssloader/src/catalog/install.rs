//! Installing catalog themes.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use super::client::CatalogClient;
use super::error::{CatalogError, Result};
use crate::theme::{Theme, ThemeManager};

/// Download and install a catalog theme, then any of its dependencies that
/// are not installed yet, recursively.
///
/// Dependencies are resolved by exact name through a catalog search. A
/// dependency the catalog does not know fails the install; themes already
/// unpacked by then stay installed.
pub async fn install_theme(
    client: &CatalogClient,
    themes: &ThemeManager,
    theme_id: &str,
) -> Result<Vec<Theme>> {
    let mut queue = VecDeque::from([theme_id.to_string()]);
    let mut seen = HashSet::new();
    let mut installed = Vec::new();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }

        let details = client.get_theme(&id).await?;
        let archive = client.download_blob(&details.download.id).await?;
        let added = themes.install_archive(archive).await?;
        info!(theme = %details.name, id = %id, "Installed theme from catalog");

        for theme in &added {
            for dependency in &theme.dependencies {
                if themes.registry().find_by_name(dependency).is_some() {
                    continue;
                }
                let entry = client
                    .find_theme_by_name(dependency)
                    .await?
                    .ok_or_else(|| CatalogError::DependencyNotFound {
                        theme: theme.name.clone(),
                        dependency: dependency.clone(),
                    })?;
                debug!(theme = %theme.name, dependency = %dependency, "Queued missing dependency");
                queue.push_back(entry.id);
            }
        }

        installed.extend(added);
    }

    Ok(installed)
}
