//! Locating team documents in the governance repository checkout.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use governance::{CodeRepository, TEAMS_DIRECTORY, TEAM_FILE_NAME};

use crate::context::CiContext;

/// Every `teams/<team>/` directory, sorted by name.
pub fn team_directories(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let teams_dir = root.join(TEAMS_DIRECTORY);
    if !teams_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(&teams_dir)
        .with_context(|| format!("Failed to list {}", teams_dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to list {}", teams_dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Every `teams/*/teams.yml`, sorted.
pub fn team_files(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(team_directories(root)?
        .into_iter()
        .map(|(_, dir)| dir.join(TEAM_FILE_NAME))
        .filter(|file| file.is_file())
        .collect())
}

/// Keeps the files whose root-relative path appears in `changed`.
pub fn retain_changed(root: &Path, files: Vec<PathBuf>, changed: &[String]) -> Vec<PathBuf> {
    let changed: BTreeSet<&str> = changed.iter().map(String::as_str).collect();
    files
        .into_iter()
        .filter(|file| {
            file.strip_prefix(root)
                .ok()
                .map(|rel| {
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .is_some_and(|rel| changed.contains(rel.as_str()))
        })
        .collect()
}

/// The team documents a run should process.
///
/// On a push event only the documents changed by the push are kept; when
/// the comparison cannot be made every document is processed.
pub async fn select_team_files(
    root: &Path,
    ctx: &CiContext,
    repository: Option<&dyn CodeRepository>,
) -> Result<Vec<PathBuf>> {
    let all = team_files(root)?;
    if !ctx.is_filtered_push() {
        return Ok(all);
    }

    let (Some(repository), Some((before, after))) = (repository, ctx.push_range()) else {
        tracing::warn!("Push event without a comparable commit range; processing every team file");
        return Ok(all);
    };

    match repository.changed_files(&before, &after).await {
        Ok(changed) => {
            let selected = retain_changed(root, all, &changed);
            tracing::info!(
                changed = changed.len(),
                selected = selected.len(),
                "Selected team files changed by the push"
            );
            Ok(selected)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to compare commits; processing every team file");
            Ok(all)
        }
    }
}
